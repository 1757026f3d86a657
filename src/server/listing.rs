use std::fs;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use super::response::escape_html;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Name for display; bytes that are not UTF-8 are replaced.
    pub name: String,
    /// Percent-encoded from the raw name bytes, so links resolve even
    /// when `name` is lossy.
    pub encoded: String,
    pub is_dir: bool,
    pub is_symlink: bool,
}

impl Entry {
    fn display_name(&self) -> String {
        if self.is_symlink {
            format!("{}@", self.name)
        } else if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }

    fn href(&self) -> String {
        if self.is_dir {
            format!("{}/", self.encoded)
        } else {
            self.encoded.clone()
        }
    }
}

/// Entries of `dir`, sorted case-insensitively.
pub fn read_entries(dir: &Path) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for item in fs::read_dir(dir)? {
        let item = item?;
        let file_type = item.file_type()?;
        let is_symlink = file_type.is_symlink();
        let is_dir = if is_symlink {
            item.path().is_dir()
        } else {
            file_type.is_dir()
        };
        let file_name = item.file_name();
        entries.push(Entry {
            name: file_name.to_string_lossy().into_owned(),
            encoded: urlencoding::encode_binary(file_name.as_bytes()).into_owned(),
            is_dir,
            is_symlink,
        });
    }
    entries.sort_by_key(|entry| entry.name.to_lowercase());
    Ok(entries)
}

pub fn render(url_path: &str, entries: &[Entry]) -> String {
    let title = format!("Directory listing for {}", escape_html(url_path));
    let mut page = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for entry in entries {
        page.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            entry.href(),
            escape_html(&entry.display_name())
        ));
    }
    page.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempdir::TempDir;

    fn entry(name: &str, is_dir: bool, is_symlink: bool) -> Entry {
        Entry {
            name: name.to_string(),
            encoded: urlencoding::encode(name).into_owned(),
            is_dir,
            is_symlink,
        }
    }

    #[test]
    fn renders_links_and_markers() {
        let page = render(
            "/assets/",
            &[
                entry("css", true, false),
                entry("a b&c.txt", false, false),
                entry("latest", false, true),
            ],
        );
        assert!(page.contains("<title>Directory listing for /assets/</title>"));
        assert!(page.contains("<a href=\"css/\">css/</a>"));
        assert!(page.contains("<a href=\"a%20b%26c.txt\">a b&amp;c.txt</a>"));
        assert!(page.contains("<a href=\"latest\">latest@</a>"));
    }

    #[test]
    fn escapes_title() {
        let page = render("/<x>/", &[]);
        assert!(page.contains("Directory listing for /&lt;x&gt;/"));
    }

    #[test]
    fn reads_sorted_entries() {
        let dir = TempDir::new("listing").unwrap();
        fs::write(dir.path().join("beta.txt"), "b").unwrap();
        fs::write(dir.path().join("Alpha.txt"), "a").unwrap();
        fs::create_dir(dir.path().join("gamma")).unwrap();

        let entries = read_entries(dir.path()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha.txt", "beta.txt", "gamma"]);
        assert!(entries[2].is_dir);
        assert!(!entries[0].is_dir);
    }

    #[test]
    fn links_non_utf8_names_by_their_bytes() {
        use std::ffi::OsStr;

        let dir = TempDir::new("listing").unwrap();
        fs::write(dir.path().join(OsStr::from_bytes(b"caf\xe9.txt")), "x").unwrap();

        let entries = read_entries(dir.path()).unwrap();
        assert_eq!(entries[0].name, "caf\u{fffd}.txt");
        assert_eq!(entries[0].encoded.to_lowercase(), "caf%e9.txt");

        let page = render("/", &entries);
        assert!(page.to_lowercase().contains("<a href=\"caf%e9.txt\">"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = TempDir::new("listing").unwrap();
        let err = read_entries(&dir.path().join("nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
