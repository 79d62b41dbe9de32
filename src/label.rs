//! Device label cleanup.

/// Strip a trailing hardware id such as `" (1a2b3c:4d5e6f)"` from a device
/// label.
///
/// Falls back to the raw label when stripping would leave nothing, and to
/// `None` when there is no label at all.
pub fn camera_name(label: Option<&str>) -> Option<String> {
    let label = label?;
    let clean = strip_hardware_id(label);

    if !clean.is_empty() {
        Some(clean.to_owned())
    } else if !label.is_empty() {
        Some(label.to_owned())
    } else {
        None
    }
}

/// `label` without a `\s*\(hex(:hex)?\)\s*` suffix, or `label` itself when
/// there is no such suffix.
fn strip_hardware_id(label: &str) -> &str {
    let Some(inner) = label.trim_end().strip_suffix(')') else {
        return label;
    };
    let Some((head, id)) = inner.rsplit_once('(') else {
        return label;
    };

    if is_hardware_id(id) {
        head.trim_end()
    } else {
        label
    }
}

fn is_hardware_id(id: &str) -> bool {
    match id.split_once(':') {
        Some((first, second)) => is_hex(first) && is_hex(second),
        None => is_hex(id),
    }
}

// Platforms report these ids in lowercase only.
fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_usb_id_pair() {
        assert_eq!(
            camera_name(Some("FaceTime HD Camera (1a2b3c:4d5e6f)")).as_deref(),
            Some("FaceTime HD Camera")
        );
    }

    #[test]
    fn test_strips_single_hex_id() {
        assert_eq!(
            camera_name(Some("Integrated Webcam (0c45)")).as_deref(),
            Some("Integrated Webcam")
        );
        assert_eq!(
            camera_name(Some("Logitech BRIO  (046d:085e)  ")).as_deref(),
            Some("Logitech BRIO")
        );
    }

    #[test]
    fn test_keeps_labels_without_suffix() {
        for label in [
            "Back Camera",
            "USB Camera (front)",
            "Webcam (0C45)",
            "Cam (12:34:56)",
            "Cam (:12)",
            "Cam ()",
            "Cam (1a2b) extra",
            "  padded  ",
        ] {
            assert_eq!(camera_name(Some(label)).as_deref(), Some(label), "{label}");
        }
    }

    #[test]
    fn test_suffix_only_label_falls_back_to_original() {
        assert_eq!(camera_name(Some("(abcdef)")).as_deref(), Some("(abcdef)"));
        assert_eq!(
            camera_name(Some("  (12:ab) ")).as_deref(),
            Some("  (12:ab) ")
        );
    }

    #[test]
    fn test_missing_label() {
        assert_eq!(camera_name(Some("")), None);
        assert_eq!(camera_name(None), None);
    }

    #[test]
    fn test_only_last_group_is_stripped() {
        assert_eq!(
            camera_name(Some("Dual (ab) Cam (cd:ef)")).as_deref(),
            Some("Dual (ab) Cam")
        );
    }
}
