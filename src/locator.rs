//! Describe instance locations in terms of the experiment description layout.
//!
//! An experiment description has three top-level sections: `parameters`,
//! `tasks` and `graph`. Paths inside them are phrased the way an author thinks
//! about them ("step \"train\" dependencies"); anything else is rendered as a
//! slash-delimited path.

use crate::types::PathToken;

/// Render a path with a filesystem-like syntax: `/` for the empty path,
/// `/tok1/tok2` otherwise.
pub fn format_path(path: &[PathToken]) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.iter().map(|t| format!("/{}", t)).collect()
}

/// Describe the location an instance path points to.
///
/// Never fails: unrecognized shapes use [`format_path`].
pub fn locate(path: &[PathToken]) -> String {
    describe(path).unwrap_or_else(|| {
        format!("experiment description location {}", format_path(path))
    })
}

fn describe(path: &[PathToken]) -> Option<String> {
    let Some(section) = path.first() else {
        return Some("root level of experiment description".to_string());
    };

    match section {
        PathToken::Key(name) if name == "parameters" => Some(match path.get(1) {
            None => "global parameters section".to_string(),
            // Parameters are a mapping of names, or a list of names.
            Some(PathToken::Key(param)) => format!("parameter \"{}\"", param),
            Some(PathToken::Index(i)) => format!("parameter #{}", i + 1),
        }),
        PathToken::Key(name) if name == "tasks" => Some(match path.get(1) {
            None => "tasks section".to_string(),
            Some(task) => {
                let mut desc = format!("task plugin \"{}\"", task);
                match path.get(2) {
                    Some(t) if t.is_key("outputs") => desc.push_str(" outputs"),
                    Some(t) if t.is_key("plugin") => desc.push_str(" plugin ID"),
                    _ => {}
                }
                desc
            }
        }),
        PathToken::Key(name) if name == "graph" => Some(match path.get(1) {
            None => "graph section".to_string(),
            Some(step) => {
                let mut desc = format!("step \"{}\"", step);
                if path.get(2).is_some_and(|t| t.is_key("dependencies")) {
                    desc.push_str(" dependencies");
                }
                desc
            }
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(tokens: &[&str]) -> Vec<PathToken> {
        tokens.iter().map(|t| PathToken::from(*t)).collect()
    }

    #[test]
    fn root() {
        assert_eq!(locate(&[]), "root level of experiment description");
    }

    #[test]
    fn parameters() {
        assert_eq!(locate(&path(&["parameters"])), "global parameters section");
        assert_eq!(
            locate(&path(&["parameters", "learning_rate"])),
            "parameter \"learning_rate\""
        );
        assert_eq!(
            locate(&["parameters".into(), PathToken::Index(2)]),
            "parameter #3"
        );
    }

    #[test]
    fn parameter_tail_is_ignored() {
        assert_eq!(
            locate(&path(&["parameters", "epochs", "default"])),
            "parameter \"epochs\""
        );
    }

    #[test]
    fn tasks() {
        assert_eq!(locate(&path(&["tasks"])), "tasks section");
        assert_eq!(locate(&path(&["tasks", "train"])), "task plugin \"train\"");
        assert_eq!(
            locate(&path(&["tasks", "train", "outputs"])),
            "task plugin \"train\" outputs"
        );
        assert_eq!(
            locate(&path(&["tasks", "train", "plugin"])),
            "task plugin \"train\" plugin ID"
        );
        assert_eq!(
            locate(&path(&["tasks", "train", "inputs", "data"])),
            "task plugin \"train\""
        );
    }

    #[test]
    fn graph() {
        assert_eq!(locate(&path(&["graph"])), "graph section");
        assert_eq!(
            locate(&path(&["graph", "step1", "dependencies"])),
            "step \"step1\" dependencies"
        );
        assert_eq!(
            locate(&["graph".into(), "step1".into(), PathToken::Index(0)]),
            "step \"step1\""
        );
    }

    #[test]
    fn fallback() {
        assert_eq!(
            locate(&path(&["unknown", "x"])),
            "experiment description location /unknown/x"
        );
        assert_eq!(
            locate(&[PathToken::Index(0), "types".into()]),
            "experiment description location /0/types"
        );
    }

    #[test]
    fn format_path_forms() {
        assert_eq!(format_path(&[]), "/");
        assert_eq!(
            format_path(&["tasks".into(), PathToken::Index(1)]),
            "/tasks/1"
        );
    }
}
