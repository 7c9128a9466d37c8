use super::error::ConnectorError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_ACCESS_VAR: &str = "ACCESS_KEY";
pub const DEFAULT_SECRET_VAR: &str = "SECRET_KEY";
pub const DEFAULT_DOTENV_FILE: &str = ".env";
/// Environment variable naming a key file to try before the directory search.
pub const DOTENV_OVERRIDE_VAR: &str = "ONSHAPE_DOTENV";

/// An Onshape API key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Whatever part of a key pair a single source provides.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PartialCredentials {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl PartialCredentials {
    pub fn is_complete(&self) -> bool {
        self.access_key.is_some() && self.secret_key.is_some()
    }

    /// Fills the keys that are still missing from `other`. Keys already present are kept.
    pub fn fill_from(&mut self, other: PartialCredentials) {
        if self.access_key.is_none() {
            self.access_key = other.access_key;
        }
        if self.secret_key.is_none() {
            self.secret_key = other.secret_key;
        }
    }

    pub fn complete(self) -> Option<Credentials> {
        Some(Credentials {
            access_key: self.access_key?,
            secret_key: self.secret_key?,
        })
    }
}

impl fmt::Debug for PartialCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialCredentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A source of Onshape API keys.
pub trait CredentialResolver: fmt::Debug {
    /// Returns whatever keys this source holds. Empty values count as missing.
    fn lookup(&self) -> PartialCredentials;

    /// Short human-readable description used in error messages.
    fn describe(&self) -> String;

    /// Resolves a complete key pair.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Authentication`] if either key is missing.
    fn resolve(&self) -> Result<Credentials, ConnectorError> {
        self.lookup().complete().ok_or_else(|| {
            ConnectorError::Authentication(format!(
                "Missing Onshape credentials: no access and secret key found in {}",
                self.describe()
            ))
        })
    }
}

/// Keys given directly in code.
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub Credentials);

impl CredentialResolver for StaticCredentials {
    fn lookup(&self) -> PartialCredentials {
        PartialCredentials {
            access_key: non_empty(self.0.access_key.clone()),
            secret_key: non_empty(self.0.secret_key.clone()),
        }
    }

    fn describe(&self) -> String {
        "static credentials".to_string()
    }
}

/// Keys read from two environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvCredentials {
    pub access_var: String,
    pub secret_var: String,
}

impl EnvCredentials {
    pub fn new(access_var: impl Into<String>, secret_var: impl Into<String>) -> Self {
        Self {
            access_var: access_var.into(),
            secret_var: secret_var.into(),
        }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(DEFAULT_ACCESS_VAR, DEFAULT_SECRET_VAR)
    }
}

impl CredentialResolver for EnvCredentials {
    fn lookup(&self) -> PartialCredentials {
        PartialCredentials {
            access_key: std::env::var(&self.access_var).ok().and_then(non_empty),
            secret_key: std::env::var(&self.secret_var).ok().and_then(non_empty),
        }
    }

    fn describe(&self) -> String {
        format!(
            "environment variables {} and {}",
            self.access_var, self.secret_var
        )
    }
}

/// Keys read from a `KEY=value` file found by walking up from a start directory.
///
/// An explicit override file is tried first. Then `file_name` is looked up in the start directory
/// and each of its ancestors, stopping after the ceiling directory if one is set. Keys may come
/// from different files; the search stops as soon as both are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DotenvSearch {
    start: PathBuf,
    file_name: String,
    override_file: Option<PathBuf>,
    ceiling: Option<PathBuf>,
    access_var: String,
    secret_var: String,
}

impl DotenvSearch {
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            start: start.into(),
            file_name: DEFAULT_DOTENV_FILE.to_string(),
            override_file: None,
            ceiling: None,
            access_var: DEFAULT_ACCESS_VAR.to_string(),
            secret_var: DEFAULT_SECRET_VAR.to_string(),
        }
    }

    /// Searches from the current directory, honoring the override file named by
    /// [`DOTENV_OVERRIDE_VAR`].
    pub fn from_current_dir() -> Self {
        let start = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let search = Self::new(start);
        match std::env::var_os(DOTENV_OVERRIDE_VAR) {
            Some(path) if !path.is_empty() => search.override_file(PathBuf::from(path)),
            _ => search,
        }
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    pub fn override_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_file = Some(path.into());
        self
    }

    pub fn ceiling(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ceiling = Some(dir.into());
        self
    }

    pub fn keys(mut self, access_var: impl Into<String>, secret_var: impl Into<String>) -> Self {
        self.access_var = access_var.into();
        self.secret_var = secret_var.into();
        self
    }

    /// Files to try, in order.
    pub fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = self.override_file.iter().cloned().collect();
        for dir in self.start.ancestors() {
            candidates.push(dir.join(&self.file_name));
            if self.ceiling.as_deref() == Some(dir) {
                break;
            }
        }
        candidates
    }

    fn read_file(&self, path: &Path) -> Option<PartialCredentials> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                if path.exists() {
                    debug!(path = %path.display(), error = %e, "Skipping unreadable key file");
                }
                return None;
            }
        };
        let mut found = PartialCredentials::default();
        for (key, value) in parse_dotenv(&contents) {
            if key == self.access_var && found.access_key.is_none() {
                found.access_key = non_empty(value);
            } else if key == self.secret_var && found.secret_key.is_none() {
                found.secret_key = non_empty(value);
            }
        }
        debug!(path = %path.display(), "Read key file");
        Some(found)
    }
}

impl CredentialResolver for DotenvSearch {
    fn lookup(&self) -> PartialCredentials {
        let mut found = PartialCredentials::default();
        for candidate in self.candidates() {
            if let Some(partial) = self.read_file(&candidate) {
                found.fill_from(partial);
                if found.is_complete() {
                    break;
                }
            }
        }
        found
    }

    fn describe(&self) -> String {
        format!(
            "'{}' files searched upward from {}",
            self.file_name,
            self.start.display()
        )
    }
}

/// Tries several resolvers in order, combining keys across them.
#[derive(Debug, Default)]
pub struct ChainResolver {
    resolvers: Vec<Box<dyn CredentialResolver>>,
}

impl ChainResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolver: impl CredentialResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// Environment variables first, then key files found from the current directory.
    pub fn default_chain() -> Self {
        Self::new()
            .with(EnvCredentials::default())
            .with(DotenvSearch::from_current_dir())
    }
}

impl CredentialResolver for ChainResolver {
    fn lookup(&self) -> PartialCredentials {
        let mut found = PartialCredentials::default();
        for resolver in &self.resolvers {
            found.fill_from(resolver.lookup());
            if found.is_complete() {
                break;
            }
        }
        found
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.resolvers.iter().map(|r| r.describe()).collect();
        if parts.is_empty() {
            "an empty resolver chain".to_string()
        } else {
            parts.join(", then ")
        }
    }
}

/// Parses `KEY=value` lines. Blank lines and `#` comments are skipped, an `export ` prefix is
/// ignored, and surrounding quotes are stripped from values.
pub fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let key = key.trim();
            let key = key.strip_prefix("export ").unwrap_or(key).trim();
            let value = value.trim().trim_matches(|c: char| c == '"' || c == '\'');
            (key.to_string(), value.to_string())
        })
        .collect()
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn parse_dotenv_handles_comments_quotes_and_export() {
        let contents = "\
# Onshape keys
ACCESS_KEY = \"abc123\"

export SECRET_KEY='s3cr=t'
MALFORMED LINE
";
        let pairs = parse_dotenv(contents);
        assert_eq!(
            pairs,
            vec![
                ("ACCESS_KEY".to_string(), "abc123".to_string()),
                ("SECRET_KEY".to_string(), "s3cr=t".to_string()),
            ]
        );
    }

    #[test]
    fn dotenv_search_walks_up_to_ancestor() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".env"), "ACCESS_KEY=a\nSECRET_KEY=s\n").unwrap();
        let nested = dir.path().join("one").join("two");
        fs::create_dir_all(&nested).unwrap();

        let search = DotenvSearch::new(&nested).ceiling(dir.path());
        let credentials = search.resolve().unwrap();
        assert_eq!(credentials.access_key(), "a");
        assert_eq!(credentials.secret_key(), "s");
    }

    #[test]
    fn dotenv_search_stops_at_ceiling() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".env"), "ACCESS_KEY=a\nSECRET_KEY=s\n").unwrap();
        let nested = dir.path().join("project");
        fs::create_dir_all(&nested).unwrap();

        let search = DotenvSearch::new(&nested).ceiling(&nested);
        assert_eq!(search.candidates(), vec![nested.join(".env")]);
        assert!(matches!(
            search.resolve(),
            Err(ConnectorError::Authentication(_))
        ));
    }

    #[test]
    fn override_file_wins_and_keys_combine_across_files() {
        let dir = tempdir().unwrap();
        let override_path = dir.path().join("keys.env");
        fs::write(&override_path, "ACCESS_KEY=from-override\n").unwrap();
        fs::write(
            dir.path().join(".env"),
            "ACCESS_KEY=ignored\nSECRET_KEY=from-dotenv\n",
        )
        .unwrap();

        let search = DotenvSearch::new(dir.path())
            .override_file(&override_path)
            .ceiling(dir.path());
        let credentials = search.resolve().unwrap();
        assert_eq!(credentials.access_key(), "from-override");
        assert_eq!(credentials.secret_key(), "from-dotenv");
    }

    #[test]
    fn custom_file_name_and_key_names() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("onshape.keys"),
            "ONSHAPE_ACCESS=a\nONSHAPE_SECRET=s\n",
        )
        .unwrap();
        let search = DotenvSearch::new(dir.path())
            .file_name("onshape.keys")
            .keys("ONSHAPE_ACCESS", "ONSHAPE_SECRET")
            .ceiling(dir.path());
        assert!(search.resolve().is_ok());
    }

    #[test]
    #[serial]
    fn env_credentials_read_named_variables() {
        let resolver = EnvCredentials::new("SYSGEO_TEST_ACCESS_1", "SYSGEO_TEST_SECRET_1");
        unsafe {
            std::env::set_var("SYSGEO_TEST_ACCESS_1", "env-access");
            std::env::set_var("SYSGEO_TEST_SECRET_1", "env-secret");
        }
        let credentials = resolver.resolve();
        unsafe {
            std::env::remove_var("SYSGEO_TEST_ACCESS_1");
            std::env::remove_var("SYSGEO_TEST_SECRET_1");
        }
        let credentials = credentials.unwrap();
        assert_eq!(credentials.access_key(), "env-access");
        assert_eq!(credentials.secret_key(), "env-secret");
    }

    #[test]
    #[serial]
    fn chain_combines_env_and_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".env"), "SECRET_KEY=file-secret\n").unwrap();
        unsafe {
            std::env::set_var("SYSGEO_TEST_ACCESS_2", "env-access");
        }
        let chain = ChainResolver::new()
            .with(EnvCredentials::new("SYSGEO_TEST_ACCESS_2", "SYSGEO_TEST_SECRET_2"))
            .with(DotenvSearch::new(dir.path()).ceiling(dir.path()));
        let credentials = chain.resolve();
        unsafe {
            std::env::remove_var("SYSGEO_TEST_ACCESS_2");
        }
        let credentials = credentials.unwrap();
        assert_eq!(credentials.access_key(), "env-access");
        assert_eq!(credentials.secret_key(), "file-secret");
    }

    #[test]
    fn empty_values_count_as_missing() {
        let resolver = StaticCredentials(Credentials::new("key", "  "));
        assert!(!resolver.lookup().is_complete());
        assert!(resolver.resolve().is_err());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let credentials = Credentials::new("visible", "hidden");
        let text = format!("{credentials:?}");
        assert!(text.contains("visible"));
        assert!(!text.contains("hidden"));
    }
}
