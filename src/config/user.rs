use crate::record;

/// Fixed fields of every slot account.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PasswdConfig {
    pub password: Option<String>,
    pub gecos: Option<String>,
    pub home: Option<String>,
    pub shell: Option<String>,
}

impl PasswdConfig {
    pub fn builtin() -> Self {
        PasswdConfig {
            password: Some(lossy(record::ACCOUNT_PASSWD)),
            gecos: Some(lossy(record::ACCOUNT_GECOS)),
            home: Some(lossy(record::ACCOUNT_HOME)),
            shell: Some(lossy(record::ACCOUNT_SHELL)),
        }
    }

    pub fn merge(&mut self, other: PasswdConfig) {
        self.password = other.password.or(self.password.take());
        self.gecos = other.gecos.or(self.gecos.take());
        self.home = other.home.or(self.home.take());
        self.shell = other.shell.or(self.shell.take());
    }
}

/// Fixed fields of every slot group.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct GroupConfig {
    pub password: Option<String>,
    // Slot groups are private to their account, so this is always empty
    #[serde(default)]
    pub members: Vec<String>,
}

impl GroupConfig {
    pub fn builtin() -> Self {
        GroupConfig {
            password: Some(lossy(record::GROUP_PASSWD)),
            members: Vec::new(),
        }
    }

    pub fn merge(&mut self, other: GroupConfig) {
        self.password = other.password.or(self.password.take());
        self.members.extend(other.members);
    }
}

fn lossy(s: &std::ffi::CStr) -> String {
    s.to_string_lossy().into_owned()
}
