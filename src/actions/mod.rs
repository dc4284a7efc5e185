//! Mapping of user actions to native desktop commands
//!
//! `Dispatcher::build` is a pure lookup over desktop x action. Running the
//! resulting command lives in `run`.

pub mod follow;
pub mod run;

pub use follow::{follow, render_plain};
pub use run::{ActionOutcome, perform, perform_and_follow};

use std::path::PathBuf;
use thiserror::Error;

use crate::common::DesktopEnvironment;
use crate::common::shell::{and_chain, join_words};
use crate::context::AppContext;
use crate::theme::ThemeFlavor;
use crate::theme::kdeglobals::{BREEZE_DARK, BREEZE_LIGHT};

/// Logical task names used for single-flight supervision
pub const UPDATE_TASK: &str = "system-update";
pub const MIRRORS_TASK: &str = "mirrorlist-update";
pub const INSTALLER_TASK: &str = "installer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    ToggleTheme { dark: bool, flavor: ThemeFlavor },
    UpdateSystem,
    /// Shell command line produced by the mirror list builder
    RefreshMirrors { command: String },
    LaunchInstaller,
    OpenDisplaySettings,
}

impl ActionRequest {
    pub fn label(&self) -> &'static str {
        match self {
            ActionRequest::ToggleTheme { .. } => "Theme switching",
            ActionRequest::UpdateSystem => "System update",
            ActionRequest::RefreshMirrors { .. } => "Mirror list update",
            ActionRequest::LaunchInstaller => "Installer",
            ActionRequest::OpenDisplaySettings => "Display settings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Fire and forget, output is not captured
    Detached,
    /// Run to completion and check the exit status
    Blocking,
    /// Run through the supervisor under a logical task name
    Supervised { task: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub mode: ExecutionMode,
}

impl CommandSpec {
    fn new(program: &str, args: &[&str], mode: ExecutionMode) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            mode,
        }
    }

    fn with_shell(shell: &str, script: String, mode: ExecutionMode) -> Self {
        Self {
            program: shell.to_string(),
            args: vec!["-c".to_string(), script],
            mode,
        }
    }

    /// Quoted command line, for display and dry runs
    pub fn command_line(&self) -> String {
        let mut words = vec![self.program.clone()];
        words.extend(self.args.iter().cloned());
        join_words(&words)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("{action} is not supported on the '{desktop}' desktop")]
    Unsupported {
        desktop: DesktopEnvironment,
        action: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    home: PathBuf,
    privilege_helper: String,
    update_command: Vec<String>,
    installer_command: String,
}

impl Dispatcher {
    pub fn from_context(ctx: &AppContext) -> Self {
        Self {
            home: ctx.home.clone(),
            privilege_helper: ctx.config.privilege_helper.clone(),
            update_command: ctx.config.update_command.clone(),
            installer_command: ctx.config.installer_command.clone(),
        }
    }

    pub fn build(
        &self,
        desktop: DesktopEnvironment,
        request: &ActionRequest,
    ) -> Result<CommandSpec, DispatchError> {
        if !desktop.is_supported() {
            return Err(DispatchError::Unsupported {
                desktop,
                action: request.label(),
            });
        }

        let spec = match request {
            ActionRequest::ToggleTheme { dark, flavor } => self.theme(desktop, *dark, *flavor),
            ActionRequest::UpdateSystem => self.update(desktop),
            ActionRequest::OpenDisplaySettings => display_settings(desktop),
            ActionRequest::RefreshMirrors { command } => CommandSpec::with_shell(
                "sh",
                command.clone(),
                ExecutionMode::Supervised { task: MIRRORS_TASK },
            ),
            ActionRequest::LaunchInstaller => CommandSpec::with_shell(
                "bash",
                self.installer_command.clone(),
                ExecutionMode::Supervised {
                    task: INSTALLER_TASK,
                },
            ),
        };

        Ok(spec)
    }

    fn theme(&self, desktop: DesktopEnvironment, dark: bool, flavor: ThemeFlavor) -> CommandSpec {
        let mode = ExecutionMode::Blocking;
        let color_scheme = if dark { "prefer-dark" } else { "prefer-light" };

        match (desktop, flavor) {
            (DesktopEnvironment::Kde, ThemeFlavor::Stock) => CommandSpec::new(
                "lookandfeeltool",
                &["--apply", if dark { BREEZE_DARK } else { BREEZE_LIGHT }],
                mode,
            ),
            (DesktopEnvironment::Kde, ThemeFlavor::Themed) => {
                let (scheme, decoration) = if dark {
                    ("Qogirdark", "__aurorae__svg__Qogir-dark-circle")
                } else {
                    ("Qogirlight", "__aurorae__svg__Qogir-light-circle")
                };
                let kwinrc = self.home.join(".config/kwinrc").to_string_lossy().into_owned();
                let script = and_chain(&[
                    join_words(&["plasma-apply-colorscheme", scheme]),
                    join_words(&[
                        "kwriteconfig6",
                        "--file",
                        kwinrc.as_str(),
                        "--group",
                        "org.kde.kdecoration2",
                        "--key",
                        "theme",
                        decoration,
                    ]),
                    join_words(&["qdbus6", "org.kde.KWin", "/KWin", "reconfigure"]),
                ]);
                CommandSpec::with_shell("sh", script, mode)
            }
            (DesktopEnvironment::Gnome, ThemeFlavor::Stock) => CommandSpec::new(
                "gsettings",
                &["set", "org.gnome.desktop.interface", "color-scheme", color_scheme],
                mode,
            ),
            (DesktopEnvironment::Gnome, ThemeFlavor::Themed) => {
                let shell_theme = if dark { "Orchis-Red-Dark" } else { "Orchis-Light" };
                let script = and_chain(&[
                    join_words(&[
                        "gsettings",
                        "set",
                        "org.gnome.desktop.interface",
                        "color-scheme",
                        color_scheme,
                    ]),
                    join_words(&[
                        "gsettings",
                        "set",
                        "org.gnome.shell.extensions.user-theme",
                        "name",
                        shell_theme,
                    ]),
                ]);
                CommandSpec::with_shell("sh", script, mode)
            }
            (_, flavor) => {
                let theme = match (flavor, dark) {
                    (ThemeFlavor::Themed, true) => "Qogir-Dark",
                    (ThemeFlavor::Themed, false) => "Qogir-Light",
                    (ThemeFlavor::Stock, true) => "Adwaita-dark",
                    (ThemeFlavor::Stock, false) => "Adwaita",
                };
                let script = and_chain(&[
                    join_words(&["xfconf-query", "-c", "xsettings", "-p", "/Net/ThemeName", "-s", theme]),
                    join_words(&["xfconf-query", "-c", "xfwm4", "-p", "/general/theme", "-s", theme]),
                ]);
                CommandSpec::with_shell("sh", script, mode)
            }
        }
    }

    fn update(&self, desktop: DesktopEnvironment) -> CommandSpec {
        let (terminal, exec_flag, elevate) = match desktop {
            DesktopEnvironment::Kde => ("konsole", "-e", "sudo"),
            DesktopEnvironment::Gnome => ("gnome-terminal", "--", "sudo"),
            _ => ("xfce4-terminal", "-x", self.privilege_helper.as_str()),
        };

        let mut args = vec![exec_flag.to_string(), elevate.to_string()];
        args.extend(self.update_command.iter().cloned());

        CommandSpec {
            program: terminal.to_string(),
            args,
            mode: ExecutionMode::Supervised { task: UPDATE_TASK },
        }
    }
}

fn display_settings(desktop: DesktopEnvironment) -> CommandSpec {
    let mode = ExecutionMode::Detached;
    match desktop {
        DesktopEnvironment::Kde => CommandSpec::new("kcmshell6", &["kcm_kscreen"], mode),
        DesktopEnvironment::Gnome => CommandSpec::new("gnome-control-center", &["display"], mode),
        _ => CommandSpec::new("xfce4-display-settings", &[], mode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::WelcomeConfig;

    const SUPPORTED: [DesktopEnvironment; 3] = [
        DesktopEnvironment::Gnome,
        DesktopEnvironment::Kde,
        DesktopEnvironment::Xfce,
    ];

    fn dispatcher() -> Dispatcher {
        let ctx = AppContext::new(
            DesktopEnvironment::Kde,
            WelcomeConfig::default(),
            PathBuf::from("/home/user"),
        );
        Dispatcher::from_context(&ctx)
    }

    fn all_requests() -> Vec<ActionRequest> {
        let mut requests = Vec::new();
        for dark in [true, false] {
            for flavor in [ThemeFlavor::Stock, ThemeFlavor::Themed] {
                requests.push(ActionRequest::ToggleTheme { dark, flavor });
            }
        }
        requests.push(ActionRequest::UpdateSystem);
        requests.push(ActionRequest::RefreshMirrors {
            command: "true".to_string(),
        });
        requests.push(ActionRequest::LaunchInstaller);
        requests.push(ActionRequest::OpenDisplaySettings);
        requests
    }

    #[test]
    fn test_supported_desktops_always_get_a_command() {
        let dispatcher = dispatcher();
        for desktop in SUPPORTED {
            for request in all_requests() {
                let spec = dispatcher.build(desktop, &request).unwrap();
                assert!(!spec.program.is_empty(), "{desktop} {request:?}");
            }
        }
    }

    #[test]
    fn test_unknown_desktop_is_always_unsupported() {
        let dispatcher = dispatcher();
        for request in all_requests() {
            let err = dispatcher
                .build(DesktopEnvironment::Unknown, &request)
                .unwrap_err();
            assert_eq!(
                err,
                DispatchError::Unsupported {
                    desktop: DesktopEnvironment::Unknown,
                    action: request.label(),
                }
            );
        }
    }

    #[test]
    fn test_theme_commands() {
        let d = dispatcher();

        let spec = d
            .build(
                DesktopEnvironment::Kde,
                &ActionRequest::ToggleTheme { dark: true, flavor: ThemeFlavor::Stock },
            )
            .unwrap();
        assert_eq!(
            spec.command_line(),
            "lookandfeeltool --apply org.kde.breezedark.desktop"
        );
        assert_eq!(spec.mode, ExecutionMode::Blocking);

        let spec = d
            .build(
                DesktopEnvironment::Gnome,
                &ActionRequest::ToggleTheme { dark: false, flavor: ThemeFlavor::Stock },
            )
            .unwrap();
        assert_eq!(
            spec.args,
            vec!["set", "org.gnome.desktop.interface", "color-scheme", "prefer-light"]
        );

        let spec = d
            .build(
                DesktopEnvironment::Xfce,
                &ActionRequest::ToggleTheme { dark: true, flavor: ThemeFlavor::Themed },
            )
            .unwrap();
        assert_eq!(spec.program, "sh");
        assert_eq!(
            spec.args[1],
            "xfconf-query -c xsettings -p /Net/ThemeName -s Qogir-Dark && \
             xfconf-query -c xfwm4 -p /general/theme -s Qogir-Dark"
        );

        let spec = d
            .build(
                DesktopEnvironment::Kde,
                &ActionRequest::ToggleTheme { dark: false, flavor: ThemeFlavor::Themed },
            )
            .unwrap();
        assert!(spec.args[1].starts_with("plasma-apply-colorscheme Qogirlight && "));
        assert!(spec.args[1].contains("--file /home/user/.config/kwinrc"));
        assert!(spec.args[1].contains("__aurorae__svg__Qogir-light-circle"));
        assert!(spec.args[1].ends_with("qdbus6 org.kde.KWin /KWin reconfigure"));
    }

    #[test]
    fn test_long_running_actions_are_supervised() {
        let d = dispatcher();

        let update = d.build(DesktopEnvironment::Xfce, &ActionRequest::UpdateSystem).unwrap();
        assert_eq!(
            update.command_line(),
            "xfce4-terminal -x pkexec pacman --noconfirm -Syu"
        );
        assert_eq!(update.mode, ExecutionMode::Supervised { task: UPDATE_TASK });

        let update = d.build(DesktopEnvironment::Gnome, &ActionRequest::UpdateSystem).unwrap();
        assert_eq!(
            update.command_line(),
            "gnome-terminal -- sudo pacman --noconfirm -Syu"
        );

        let installer = d
            .build(DesktopEnvironment::Gnome, &ActionRequest::LaunchInstaller)
            .unwrap();
        assert_eq!(installer.program, "bash");
        assert_eq!(installer.args, vec!["-c", "sudo calamares -D 8"]);
        assert_eq!(
            installer.mode,
            ExecutionMode::Supervised { task: INSTALLER_TASK }
        );

        let display = d
            .build(DesktopEnvironment::Kde, &ActionRequest::OpenDisplaySettings)
            .unwrap();
        assert_eq!(display.command_line(), "kcmshell6 kcm_kscreen");
        assert_eq!(display.mode, ExecutionMode::Detached);
    }
}
