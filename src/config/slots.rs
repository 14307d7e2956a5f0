use crate::slot;

/// The numeric window and name format.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SlotsConfig {
    pub count: Option<u32>,
    pub uid_lo: Option<u32>,
    pub name_prefix: Option<String>,
    pub name_digits: Option<usize>,
}

impl SlotsConfig {
    pub fn builtin() -> Self {
        SlotsConfig {
            count: Some(slot::SLOT_COUNT),
            uid_lo: Some(slot::SLOT_UID_LO),
            name_prefix: Some(char::from(slot::SLOT_NAME_PREFIX).to_string()),
            name_digits: Some(slot::SLOT_NAME_DIGITS),
        }
    }

    pub fn merge(&mut self, other: SlotsConfig) {
        self.count = other.count.or(self.count);
        self.uid_lo = other.uid_lo.or(self.uid_lo);
        self.name_prefix = other.name_prefix.or(self.name_prefix.take());
        self.name_digits = other.name_digits.or(self.name_digits);
    }
}
