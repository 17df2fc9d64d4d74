use super::types::{CommonError, ToValidate};

pub fn validate(validator: impl ToValidate) -> Result<(), CommonError> {
    validator.validate()
}

#[cfg(test)]
pub mod testconfig {
    use once_cell::sync::OnceCell;
    use std::env;
    use std::path::PathBuf;

    use crate::config::Config;
    use crate::ConfigManager;

    pub fn fixture(name: &str) -> String {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("src/config/fixtures");

        format!("{}/{}", path.display(), name)
    }

    pub fn global_config() -> &'static Config {
        static INSTANCE: OnceCell<Config> = OnceCell::new();
        INSTANCE.get_or_init(|| {
            let config_parser = ConfigManager::new(fixture("config.toml"));
            config_parser.parse().unwrap()
        })
    }
}
