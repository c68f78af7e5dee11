//! Status icons for CLI output

/// Status icons for different states
pub struct StatusIcon;

impl StatusIcon {
    pub const SUCCESS: &'static str = "✓";
    pub const WARNING: &'static str = "⚠";
    pub const ERROR: &'static str = "✗";
    pub const UNKNOWN: &'static str = "?";

    /// Icon based on ready/desired replicas
    pub fn get_replica_icon(ready: i32, desired: i32) -> &'static str {
        if desired == 0 {
            Self::UNKNOWN
        } else if ready >= desired {
            Self::SUCCESS
        } else if ready > 0 {
            Self::WARNING
        } else {
            Self::ERROR
        }
    }

    /// Status text based on ready/desired replicas
    pub fn get_status_text(ready: i32, desired: i32) -> &'static str {
        if desired == 0 {
            "Unknown"
        } else if ready >= desired {
            "Running"
        } else if ready > 0 {
            "Degraded"
        } else {
            "Failed"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_replica_icon() {
        assert_eq!(StatusIcon::get_replica_icon(3, 3), StatusIcon::SUCCESS);
        assert_eq!(StatusIcon::get_replica_icon(2, 3), StatusIcon::WARNING);
        assert_eq!(StatusIcon::get_replica_icon(0, 3), StatusIcon::ERROR);
        assert_eq!(StatusIcon::get_replica_icon(0, 0), StatusIcon::UNKNOWN);
    }

    #[test]
    fn test_get_status_text() {
        assert_eq!(StatusIcon::get_status_text(3, 3), "Running");
        assert_eq!(StatusIcon::get_status_text(1, 3), "Degraded");
        assert_eq!(StatusIcon::get_status_text(0, 3), "Failed");
    }
}
