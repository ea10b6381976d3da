//
// Copyright (c) Memfault, Inc.
// See License.txt for details
use std::borrow::Cow;
use std::io::{stdout, Write};
use std::path::Path;

use eyre::Result;
use serde_json::Value;

use super::version::VERSION;
use crate::config::{Config, FuelgaugedConfig};

fn dump_config(writer: &mut impl Write, config: &Value, config_path: Option<&Path>) -> Result<()> {
    let path_str = config_path
        .map(Path::display)
        .map(|d| Cow::Owned(d.to_string()))
        .unwrap_or_else(|| Cow::Borrowed(Config::DEFAULT_CONFIG_PATH));
    writeln!(writer, "Configuration ({}):", path_str)?;
    writeln!(writer, "{}", serde_json::to_string_pretty(config)?)?;
    Ok(())
}

fn dump_version(writer: &mut impl Write, version: &str) -> Result<()> {
    writeln!(writer, "fuelgauged version:")?;
    writeln!(writer, "  VERSION={}", version)?;
    Ok(())
}

fn dump_features(writer: &mut impl Write, features: &[&str]) -> Result<()> {
    writeln!(writer, "Features enabled:")?;
    for feature in features {
        writeln!(writer, "  {}", feature)?;
    }
    Ok(())
}

fn dump_settings(
    writer: &mut impl Write,
    config: &Value,
    config_path: Option<&Path>,
    version: &str,
    features: &[&str],
) -> Result<()> {
    dump_config(writer, config, config_path)?;
    writeln!(writer)?;
    dump_version(writer, version)?;
    writeln!(writer)?;
    dump_features(writer, features)?;
    Ok(())
}

pub fn show_settings(config_path: Option<&Path>) -> Result<()> {
    let config = FuelgaugedConfig::parse_configs(config_path)?;

    let enabled_features = [
        #[cfg(feature = "rust-tls")]
        "rust-tls",
        #[cfg(feature = "openssl-tls")]
        "openssl-tls",
        #[cfg(feature = "openssl-vendored-tls")]
        "openssl-vendored-tls",
    ];

    dump_settings(
        &mut stdout(),
        &config,
        config_path,
        VERSION,
        &enabled_features,
    )
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::PathBuf;

    use serde_json::json;

    use super::*;

    #[test]
    fn dumps_config_version_and_features() {
        let config = json!({"wake_pin": 3});
        let config_path = PathBuf::from("/tmp/fuelgauged.conf");

        let mut writer = Cursor::new(Vec::new());
        dump_settings(
            &mut writer,
            &config,
            Some(&config_path),
            "1.2.3",
            &["rust-tls"],
        )
        .unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            output,
            "Configuration (/tmp/fuelgauged.conf):\n\
             {\n  \"wake_pin\": 3\n}\n\
             \n\
             fuelgauged version:\n  VERSION=1.2.3\n\
             \n\
             Features enabled:\n  rust-tls\n"
        );
    }

    #[test]
    fn defaults_to_system_config_path() {
        let mut writer = Cursor::new(Vec::new());
        dump_config(&mut writer, &json!({}), None).unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert!(output.starts_with("Configuration (/etc/fuelgauged.conf):"));
    }
}
