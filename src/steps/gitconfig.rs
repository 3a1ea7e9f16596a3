//! Writes the user's name and email into the deployed `.gitconfig` template.
//!
//! The file is edited line by line: only the `name` and `email` entries of the
//! `[user]` section are touched, everything else is written back verbatim.

use std::{fs, path::Path};

use crate::{config::GitIdentity, error::InstallerError};

/// Sets `user.name` and `user.email` in the git config file at `path`.
pub fn configure(path: &Path, identity: &GitIdentity) -> Result<(), InstallerError> {
    let content = fs::read_to_string(path)?;
    fs::write(path, apply_identity(&content, identity))?;
    Ok(())
}

pub fn apply_identity(content: &str, identity: &GitIdentity) -> String {
    let eol = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    set_user_key(&mut lines, "name", &identity.name);
    set_user_key(&mut lines, "email", &identity.email);

    let mut out = lines.join(eol);
    out.push_str(eol);
    out
}

fn set_user_key(lines: &mut Vec<String>, key: &str, value: &str) {
    let Some((start, end)) = find_section(lines, "user") else {
        if lines.last().is_some_and(|l| !l.trim().is_empty()) {
            lines.push(String::new());
        }
        lines.push("[user]".to_string());
        lines.push(format!("\t{} = {}", key, quote(value)));
        return;
    };

    let body = start + 1..end;
    let indent = lines[body.clone()]
        .iter()
        .find(|l| entry_key(l).is_some())
        .map(|l| l[..l.len() - l.trim_start().len()].to_string())
        .unwrap_or_else(|| "\t".to_string());
    let entry = format!("{}{} = {}", indent, key, quote(value));

    if let Some(idx) = body
        .clone()
        .find(|&i| entry_key(&lines[i]).is_some_and(|k| k.eq_ignore_ascii_case(key)))
    {
        lines[idx] = entry;
        return;
    }

    // After the last non-blank line so the gap before the next section stays.
    let insert_at = body
        .rev()
        .find(|&i| !lines[i].trim().is_empty())
        .map_or(start + 1, |i| i + 1);
    lines.insert(insert_at, entry);
}

/// Returns the header index and the exclusive end of the last `[name]`
/// section without a subsection. Git lets later values win.
fn find_section(lines: &[String], name: &str) -> Option<(usize, usize)> {
    let start = lines
        .iter()
        .rposition(|l| section_name(l).is_some_and(|s| s.eq_ignore_ascii_case(name)))?;
    let end = lines[start + 1..]
        .iter()
        .position(|l| section_name(l).is_some())
        .map_or(lines.len(), |offset| start + 1 + offset);
    Some((start, end))
}

fn section_name(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('[')?;
    let close = inner.find(']')?;
    Some(inner[..close].trim())
}

fn entry_key(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with(['#', ';', '[']) {
        return None;
    }
    let key = trimmed.split_once('=').map_or(trimmed, |(k, _)| k).trim();
    (!key.is_empty()).then_some(key)
}

fn quote(value: &str) -> String {
    let needs_quotes = value.trim() != value
        || value.contains(['#', ';', '"', '\\']);
    if !needs_quotes {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> GitIdentity {
        GitIdentity {
            name: "Jane Doe".to_string(),
            email: "jane@doe.dev".to_string(),
        }
    }

    #[test]
    fn creates_user_section_when_missing() {
        let input = "[core]\n\teditor = nvim\n";
        assert_eq!(
            apply_identity(input, &jane()),
            "[core]\n\teditor = nvim\n\n[user]\n\tname = Jane Doe\n\temail = jane@doe.dev\n"
        );
    }

    #[test]
    fn replaces_existing_keys_in_place() {
        let input = "\
# top comment
[user]
    name = Old Name
    email = old@example.com
    signingkey = ABC

[core]
\teditor = vim
";
        let expected = "\
# top comment
[user]
    name = Jane Doe
    email = jane@doe.dev
    signingkey = ABC

[core]
\teditor = vim
";
        assert_eq!(apply_identity(input, &jane()), expected);
    }

    #[test]
    fn inserts_missing_key_before_blank_gap() {
        let input = "[User]\n\tname = x\n\n[alias]\n\tst = status\n";
        assert_eq!(
            apply_identity(input, &jane()),
            "[User]\n\tname = Jane Doe\n\temail = jane@doe.dev\n\n[alias]\n\tst = status\n"
        );
    }

    #[test]
    fn subsections_are_not_the_user_section() {
        let input = "[user \"work\"]\n\temail = work@corp.com\n";
        let out = apply_identity(input, &jane());
        assert!(out.starts_with("[user \"work\"]\n\temail = work@corp.com\n"));
        assert!(out.ends_with("[user]\n\tname = Jane Doe\n\temail = jane@doe.dev\n"));
    }

    #[test]
    fn last_user_section_is_the_one_edited() {
        let input = "[user]\n\tname = First\n[core]\n\teditor = vim\n[user]\n\tname = Second\n";
        assert_eq!(
            apply_identity(input, &jane()),
            "[user]\n\tname = First\n[core]\n\teditor = vim\n[user]\n\tname = Jane Doe\n\temail = jane@doe.dev\n"
        );
    }

    #[test]
    fn crlf_line_endings_are_kept() {
        let input = "[core]\r\n\teditor = nvim\r\n";
        assert_eq!(
            apply_identity(input, &jane()),
            "[core]\r\n\teditor = nvim\r\n\r\n[user]\r\n\tname = Jane Doe\r\n\temail = jane@doe.dev\r\n"
        );
    }

    #[test]
    fn empty_file_gets_a_section() {
        assert_eq!(
            apply_identity("", &jane()),
            "[user]\n\tname = Jane Doe\n\temail = jane@doe.dev\n"
        );
    }

    #[test]
    fn special_values_are_quoted() {
        assert_eq!(quote("plain value"), "plain value");
        assert_eq!(quote(" padded"), "\" padded\"");
        assert_eq!(quote("a#b"), "\"a#b\"");
        assert_eq!(quote(r#"say "hi" \o/"#), r#""say \"hi\" \\o/""#);
    }

    #[test]
    fn configure_rewrites_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("dot-gitconfig");
        fs::write(&path, "[core]\n\tautocrlf = input\n").unwrap();

        configure(&path, &jane()).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("[core]\n\tautocrlf = input\n"));
        assert!(written.contains("[user]\n\tname = Jane Doe\n\temail = jane@doe.dev\n"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(configure(&tmp.path().join("nope"), &jane()).is_err());
    }
}
