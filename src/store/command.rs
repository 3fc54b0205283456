// SPDX-License-Identifier: MIT

//! Access to live preference domains through the system `defaults` tool.

use std::{
    collections::{BTreeMap, BTreeSet},
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

use log::{debug, warn};

use crate::{
    core::{
        convert::{read_document, write_document},
        error::{EditError, Result},
        types::{Domain, PlistType, PlistValue},
    },
    store::PreferenceStore,
};

pub const DEFAULTS_PROGRAM: &str = "/usr/bin/defaults";

/// Runs `program` with `args`, feeding `stdin` when given, and returns its output.
/// Only a failure to launch the program is an error; the exit status is left to the caller.
fn run(program: &Path, args: &[&str], stdin: Option<&[u8]>) -> Result<Output> {
    debug!("running {} {}", program.display(), args.join(" "));
    let spawn_err = |e: std::io::Error| EditError::Command {
        program: program.display().to_string(),
        message: e.to_string(),
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_err)?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        pipe.write_all(input).map_err(spawn_err)?;
    }
    child.wait_with_output().map_err(spawn_err)
}

fn failure(program: &Path, output: &Output) -> EditError {
    EditError::Command {
        program: program.display().to_string(),
        message: format!(
            "{} ({})",
            String::from_utf8_lossy(&output.stderr).trim(),
            output.status
        ),
    }
}

/// Whether `defaults delete` failed only because there was nothing to delete.
fn reports_absent_key(stderr: &str) -> bool {
    stderr.contains("does not exist") || stderr.contains("not found")
}

/// Lists the domains known to the preferences system, sorted.
pub fn list_domains(program: &Path) -> Result<Vec<Domain>> {
    let output = run(program, &["domains"], None)?;
    if !output.status.success() {
        return Err(failure(program, &output));
    }
    let mut names: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect();
    names.sort();
    Ok(names.into_iter().map(Domain::User).collect())
}

/// A domain read and written through `defaults export`, `import`, `read-type` and `delete`.
#[derive(Debug, Clone)]
pub struct DefaultsCommandStore {
    domain: Domain,
    program: PathBuf,
}

impl DefaultsCommandStore {
    pub fn new(domain: Domain, program: impl Into<PathBuf>) -> Self {
        Self {
            domain,
            program: program.into(),
        }
    }

    fn import(&self, entries: BTreeMap<String, PlistValue>) -> Result<()> {
        let buf = write_document(&PlistValue::Dictionary(entries), false)?;
        let name = self.domain.defaults_arg();
        let output = run(&self.program, &["import", &name, "-"], Some(&buf))?;
        if !output.status.success() {
            return Err(failure(&self.program, &output));
        }
        Ok(())
    }
}

impl PreferenceStore for DefaultsCommandStore {
    fn domain(&self) -> &Domain {
        &self.domain
    }

    /// A domain the tool cannot export reads as empty.
    fn read_all(&self) -> Result<BTreeMap<String, PlistValue>> {
        let name = self.domain.defaults_arg();
        let output = run(&self.program, &["export", &name, "-"], None)?;
        if !output.status.success() {
            debug!("export of {name} failed, treating it as empty");
            return Ok(BTreeMap::new());
        }
        let (plist, _) = read_document(&output.stdout)?;
        plist
            .into_dictionary()
            .ok_or_else(|| EditError::InvalidRoot(name))
    }

    fn read_type(&self, key: &str) -> Result<Option<PlistType>> {
        let name = self.domain.defaults_arg();
        let output = run(&self.program, &["read-type", &name, key], None)?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(PlistType::from_read_type_output(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }

    fn write(&mut self, key: &str, value: &PlistValue) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.clone());
        self.import(entries)
    }

    fn delete_keys(&mut self, keys: &BTreeSet<String>) -> Result<()> {
        let name = self.domain.defaults_arg();
        for key in keys {
            let output = run(&self.program, &["delete", &name, key], None)?;
            if output.status.success() {
                continue;
            }
            let err = failure(&self.program, &output);
            if reports_absent_key(&String::from_utf8_lossy(&output.stderr)) {
                debug!("{key} was not set: {err}");
            } else {
                warn!("could not delete {key} from {name}: {err}");
            }
        }
        Ok(())
    }

    // the tool synchronizes with the preferences daemon on every invocation
    fn synchronize(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::{fs, os::unix::fs::PermissionsExt};
    use tempfile::TempDir;

    /// A stand-in for `defaults` that keeps one domain in a file next to the script.
    fn fake_defaults(dir: &TempDir) -> PathBuf {
        let script = dir.path().join("defaults");
        let store = dir.path().join("domain.plist");
        fs::write(
            &script,
            format!(
                r#"#!/bin/sh
STORE="{store}"
case "$1" in
  domains) echo "com.b.app, com.a.app" ;;
  export) [ -f "$STORE" ] || exit 1; cat "$STORE" ;;
  import) cat > "$STORE" ;;
  read-type) grep -q "<key>$3</key>" "$STORE" 2>/dev/null || exit 1; echo "Type is integer" ;;
  delete) echo "Domain ($2) not found." >&2; exit 1 ;;
  *) exit 2 ;;
esac
"#,
                store = store.display()
            ),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        script
    }

    #[test]
    fn round_trips_through_the_tool() {
        let dir = TempDir::new().unwrap();
        let program = fake_defaults(&dir);
        let mut store = DefaultsCommandStore::new(Domain::User("com.a.app".into()), &program);

        assert!(store.read_all().unwrap().is_empty());
        store.write("count", &PlistValue::Integer(3)).unwrap();
        assert_eq!(
            store.read_all().unwrap().get("count"),
            Some(&PlistValue::Integer(3))
        );
        assert_eq!(store.read_type("count").unwrap(), Some(PlistType::Integer));
        assert_eq!(store.read_type("missing").unwrap(), None);
        store
            .delete_keys(&BTreeSet::from(["missing".to_string()]))
            .unwrap();
    }

    #[test]
    fn tells_absent_keys_from_other_delete_failures() {
        assert!(reports_absent_key(
            "2024-01-01 defaults[1:2] \nThe domain/default pair of (com.a.app, x) does not exist"
        ));
        assert!(reports_absent_key("Domain (com.a.app) not found.\nDefaults have not been changed."));
        assert!(!reports_absent_key("Could not write domain com.a.app; exiting"));
        assert!(!reports_absent_key(""));
    }

    #[test]
    fn lists_domains_sorted() {
        let dir = TempDir::new().unwrap();
        let program = fake_defaults(&dir);
        assert_eq!(
            list_domains(&program).unwrap(),
            vec![
                Domain::User("com.a.app".into()),
                Domain::User("com.b.app".into())
            ]
        );
    }

    #[test]
    fn missing_program_is_an_error() {
        let store = DefaultsCommandStore::new(Domain::Global, "/nonexistent/defaults");
        assert!(matches!(store.read_all(), Err(EditError::Command { .. })));
    }
}
