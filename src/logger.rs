const LOG_CONFIG_FILE: &str = "log4rs.yaml";

#[ctor::ctor]
fn init() {
    if let Err(error) = log4rs::init_file(LOG_CONFIG_FILE, Default::default()) {
        eprintln!(
            "Logging disabled, unable to load '{}': {}",
            LOG_CONFIG_FILE, error
        );
    }
}
