use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static NAME_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+?)\s*#(\d+)").unwrap());

pub const UNKNOWN_ID: &str = "N/A";

/// Client name and HMIS number, taken from a file name like `Jane Doe #12345.docx`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub name: String,
    pub id: String,
}

impl ClientIdentity {
    pub fn from_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_stem(&stem)
    }

    pub fn from_stem(stem: &str) -> Self {
        match NAME_ID_RE.captures(stem) {
            Some(caps) => ClientIdentity {
                name: caps[1].trim().to_string(),
                id: caps[2].to_string(),
            },
            None => ClientIdentity {
                name: stem.to_string(),
                id: UNKNOWN_ID.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_and_id() {
        let c = ClientIdentity::from_path(Path::new("clients/Jane Doe #12345.docx"));
        assert_eq!(c.name, "Jane Doe");
        assert_eq!(c.id, "12345");
    }

    #[test]
    fn id_without_space_and_trailing_text() {
        let c = ClientIdentity::from_stem("Smith, John#77 (old)");
        assert_eq!(c.name, "Smith, John");
        assert_eq!(c.id, "77");
    }

    #[test]
    fn no_id_falls_back_to_stem() {
        let c = ClientIdentity::from_path(Path::new("Intake Packet.docx"));
        assert_eq!(c.name, "Intake Packet");
        assert_eq!(c.id, UNKNOWN_ID);

        // A '#' without digits is not an id.
        let c = ClientIdentity::from_stem("Room #A");
        assert_eq!(c.name, "Room #A");
        assert_eq!(c.id, UNKNOWN_ID);
    }
}
