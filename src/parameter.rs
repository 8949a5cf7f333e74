//! Fallback lookup for plugin parameters that were not given as a flag or primary environment variable.

pub const DEFAULT_PARAMETER_DIRS: [&str; 2] = [
    "/vela/parameters/aws-credentials",
    "/vela/secrets/aws-credentials",
];

/// Looks a parameter up in an alias environment variable, then in parameter files
#[derive(Debug, Clone)]
pub struct Resolver {
    dirs: Vec<std::path::PathBuf>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(DEFAULT_PARAMETER_DIRS.iter().map(|d| d.into()).collect())
    }
}

impl Resolver {
    pub fn new(dirs: Vec<std::path::PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn resolve(
        &self,
        value: Option<String>,
        alias_env: Option<&str>,
        file_name: Option<&str>,
    ) -> Result<Option<String>, crate::error::Error> {
        if value.is_some() {
            return Ok(value);
        }
        if let Some(v) = alias_env
            .and_then(|name| std::env::var(name).ok())
            .filter(|v| !v.is_empty())
        {
            return Ok(Some(v));
        }
        match file_name {
            Some(name) => self.read_file(name),
            None => Ok(None),
        }
    }

    fn read_file(&self, name: &str) -> Result<Option<String>, crate::error::Error> {
        for dir in self.dirs.iter() {
            let path = dir.join(name);
            match std::fs::read_to_string(&path) {
                Ok(v) => {
                    tracing::trace!(message = "read parameter file", path = ?path);
                    return Ok(Some(v.trim().to_string()));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(None)
    }
}

/// Same spellings Go's strconv.ParseBool accepts
pub fn parse_bool(name: &str, value: &str) -> Result<bool, crate::error::Error> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(crate::error::Error::ConfigError(format!(
            "{name} must be a boolean (given: {value:?})"
        ))),
    }
}

pub fn parse_int(name: &str, value: &str) -> Result<i64, crate::error::Error> {
    value.trim().parse().map_err(|_| {
        crate::error::Error::ConfigError(format!("{name} must be an integer (given: {value:?})"))
    })
}

/// Comma separated list; blank items are dropped
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_owned())
        .collect()
}
