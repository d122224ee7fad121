//! Custom figment providers.

use figment::{
    Error, Metadata, Profile, Provider,
    providers::{Env, Format, Toml},
    value::{Dict, Map, Value},
};
use std::path::{Path, PathBuf};

/// Reads `metaswap.toml`, mapping every `[profile.<name>]` table to the figment profile `<name>`.
///
/// Returns an error if `env_var` is set but names a file that does not exist. A missing default
/// file provides no data.
pub(crate) struct TomlFileProvider {
    pub env_var: Option<&'static str>,
    pub default: PathBuf,
}

impl TomlFileProvider {
    pub(crate) fn new(env_var: Option<&'static str>, default: impl Into<PathBuf>) -> Self {
        Self { env_var, default: default.into() }
    }

    fn env_val(&self) -> Option<String> {
        self.env_var.and_then(Env::var)
    }

    fn file(&self) -> PathBuf {
        self.env_val().map(PathBuf::from).unwrap_or_else(|| self.default.clone())
    }
}

impl Provider for TomlFileProvider {
    fn metadata(&self) -> Metadata {
        Toml::file(self.file()).metadata()
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        use serde::de::Error as _;

        let file = self.file();
        if let Some(var) = self.env_var
            && self.env_val().is_some()
            && !Path::new(&file).exists()
        {
            return Err(Error::custom(format!(
                "Config file `{}` set in env var `{var}` does not exist",
                file.display()
            )));
        }

        let mut map = Map::new();
        for (_, mut dict) in Toml::file(&file).data()? {
            let profiles = dict.remove("profile");
            // top level keys configure the default profile
            if !dict.is_empty() {
                map.entry(Profile::Default).or_insert_with(Dict::new).extend(dict);
            }
            let Some(profiles) = profiles else { continue };
            let Value::Dict(_, profiles) = profiles else {
                return Err(Error::custom("`profile` must be a table of profiles"));
            };
            for (name, section) in profiles {
                let Value::Dict(_, section) = section else {
                    return Err(Error::custom(format!("`profile.{name}` must be a table")));
                };
                map.entry(Profile::new(&name)).or_insert_with(Dict::new).extend(section);
            }
        }
        Ok(map)
    }
}
