use std::path::Path;

/// Marker directory mounted by archiso on live media
pub const DEFAULT_LIVE_MARKER: &str = "/run/archiso";

/// Check whether we are running from live installation media
pub fn is_live_session(marker: &Path) -> bool {
    marker.exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_marker() {
        let dir = tempfile::tempdir().unwrap();
        assert!(is_live_session(dir.path()));
        assert!(!is_live_session(&dir.path().join("archiso")));
    }
}
