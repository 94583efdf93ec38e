use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::account::Account;
use crate::distribution::ServerProfile;
use crate::errors::LaunchError;

#[cfg(windows)]
const CLASSPATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const CLASSPATH_SEPARATOR: &str = ":";

/// A fully substituted game command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl GameCommand {
    /// Build the command for `server` from its launch template.
    ///
    /// Supported placeholders: `${auth_player_name}`, `${auth_uuid}`,
    /// `${auth_access_token}`, `${game_directory}`, `${version_name}` and
    /// `${classpath}`.
    pub fn build(
        java: &Path,
        server: &ServerProfile,
        account: &Account,
        common_dir: &Path,
        game_dir: &Path,
    ) -> Result<Self, LaunchError> {
        let template = &server.launch;
        if template.main_class.trim().is_empty() {
            return Err(LaunchError::ProcessLaunch {
                message: format!("Server {} has no main class", server.id),
            });
        }

        let classpath = template
            .classpath
            .iter()
            .map(|entry| common_dir.join(entry).to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(CLASSPATH_SEPARATOR);

        let vars: HashMap<&str, String> = HashMap::from([
            ("auth_player_name", account.display_name.clone()),
            ("auth_uuid", account.uuid.clone()),
            ("auth_access_token", account.access_token.clone()),
            ("game_directory", game_dir.to_string_lossy().into_owned()),
            ("version_name", server.game_version.clone()),
            ("classpath", classpath.clone()),
        ]);

        let mut args: Vec<String> = template
            .jvm_args
            .iter()
            .map(|a| substitute(a, &vars))
            .collect();
        if !classpath.is_empty() && !template.jvm_args.iter().any(|a| a.contains("${classpath}")) {
            args.push("-cp".to_string());
            args.push(classpath);
        }
        args.push(template.main_class.clone());
        args.extend(template.game_args.iter().map(|a| substitute(a, &vars)));

        Ok(Self {
            program: java.to_path_buf(),
            args,
            working_dir: game_dir.to_path_buf(),
        })
    }

    /// Arguments with the access token masked, for logging.
    pub fn redacted_args(&self, access_token: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| {
                if access_token.is_empty() {
                    a.clone()
                } else {
                    a.replace(access_token, "<redacted>")
                }
            })
            .collect()
    }
}

/// Replace every `${name}` with its value. Unknown placeholders are kept.
fn substitute(arg: &str, vars: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(arg.len());
    let mut rest = arg;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match vars.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
