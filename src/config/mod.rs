//! The wire contract shared with the host, as a TOML document.
//!
//! The module never reads this at lookup time; the values are compiled in.
//! A host can describe what it expects and have `slots_getent -c` check it
//! against [`Config::builtin`].

use std::fmt::Debug;
use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use anyhow::bail;
use anyhow::Result;

pub mod slots;
pub mod user;

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub include: Vec<PathBuf>,
    #[serde(default)]
    pub slots: slots::SlotsConfig,
    #[serde(default)]
    pub passwd: user::PasswdConfig,
    #[serde(default)]
    pub group: user::GroupConfig,
}

impl Config {
    /// The contract this build of the module implements.
    pub fn builtin() -> Self {
        Config {
            include: Vec::new(),
            slots: slots::SlotsConfig::builtin(),
            passwd: user::PasswdConfig::builtin(),
            group: user::GroupConfig::builtin(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Config::load(path, &mut Vec::new())
    }

    /// `loading` holds the canonical paths of the files whose includes are
    /// being resolved, outermost first.
    fn load(path: &Path, loading: &mut Vec<PathBuf>) -> Result<Self> {
        let mut config: Config = match fs::read_to_string(path) {
            Ok(config_data) => match toml::from_str(&config_data) {
                Ok(config) => config,
                Err(err) => {
                    bail!("{}: failed to decode: {}", path.display(), err);
                }
            },
            Err(err) => {
                bail!("{}: failed to read: {}", path.display(), err);
            }
        };

        let canonical = match fs::canonicalize(path) {
            Ok(canonical) => canonical,
            Err(err) => {
                bail!("{}: failed to resolve: {}", path.display(), err);
            }
        };
        if loading.contains(&canonical) {
            bail!("{}: include cycle", path.display());
        }

        let config_dir = path.parent().unwrap_or(Path::new("."));

        loading.push(canonical);
        let configs = mem::take(&mut config.include)
            .into_iter()
            .map(|path| Config::load(&config_dir.join(path), loading))
            .collect::<Result<Vec<Config>>>();
        loading.pop();

        let mut configs = configs?;
        configs.push(config); // Last so it overrides its includes

        let mut config = configs.remove(0);
        for other_config in configs {
            config.merge(other_config);
        }

        Ok(config)
    }

    pub fn merge(&mut self, other: Config) {
        let Config {
            include: _,
            slots: other_slots,
            passwd: other_passwd,
            group: other_group,
        } = other;

        self.slots.merge(other_slots);
        self.passwd.merge(other_passwd);
        self.group.merge(other_group);
    }

    /// Fails, naming each field, if any value set here differs from the
    /// builtin contract. Unset fields are not checked.
    pub fn verify(&self) -> Result<()> {
        let host = self;
        let builtin = Config::builtin();
        let mut mismatches = Vec::new();

        let mut check = |field: &str, expected: &dyn Debug, actual: &dyn Debug, same: bool| {
            if !same {
                mismatches.push(format!(
                    "{}: host expects {:?}, module provides {:?}",
                    field, expected, actual
                ));
            }
        };

        macro_rules! field {
            ($section:ident . $name:ident) => {
                if let Some(expected) = &host.$section.$name {
                    let actual = builtin.$section.$name.as_ref();
                    check(
                        concat!(stringify!($section), ".", stringify!($name)),
                        expected,
                        &actual,
                        actual == Some(expected),
                    );
                }
            };
        }

        field!(slots.count);
        field!(slots.uid_lo);
        field!(slots.name_prefix);
        field!(slots.name_digits);
        field!(passwd.password);
        field!(passwd.gecos);
        field!(passwd.home);
        field!(passwd.shell);
        field!(group.password);

        if !host.group.members.is_empty() {
            check("group.members", &host.group.members, &builtin.group.members, false);
        }

        if !mismatches.is_empty() {
            bail!("contract mismatch:\n\t{}", mismatches.join("\n\t"));
        }

        Ok(())
    }
}
