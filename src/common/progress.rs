use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::ui::{OutputFormat, get_output_format};

/// Spinner shown while a blocking desktop command runs.
///
/// Hidden in JSON mode so stdout stays machine readable.
pub fn create_spinner(message: String) -> ProgressBar {
    if get_output_format() == OutputFormat::Json {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        pb.set_style(style.tick_chars("⠁⠉⠙⠚⠒⠂⠲⠴⠤⠄⠦⠖⠓⠋ "));
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Clear the spinner line and print a success message
pub fn finish_spinner_with_success(pb: ProgressBar, message: impl Into<String>) {
    pb.finish_and_clear();
    crate::ui::emit(
        crate::ui::Level::Success,
        "progress.done",
        &format!("✓ {}", message.into()),
        None,
    );
}
