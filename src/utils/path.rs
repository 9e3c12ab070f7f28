//! Path utilities: expand `~` in user-supplied paths (config, --db).

use std::path::PathBuf;

pub fn expand_tilde(path: &str) -> PathBuf {
    let Some(home) = dirs::home_dir() else {
        return PathBuf::from(path);
    };
    match path {
        "~" => home,
        p => match p.strip_prefix("~/") {
            Some(rest) => home.join(rest),
            None => PathBuf::from(p),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_leading_tilde_is_expanded() {
        assert_eq!(expand_tilde("/tmp/db.sqlite"), PathBuf::from("/tmp/db.sqlite"));
        assert_eq!(expand_tilde("data/~x"), PathBuf::from("data/~x"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/m.sqlite"), home.join("m.sqlite"));
            assert_eq!(expand_tilde("~"), home);
        }
    }
}
