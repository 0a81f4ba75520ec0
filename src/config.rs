use std::{collections::HashMap, net::IpAddr, path::PathBuf};

const DEFAULT_DIR: &str = "data";
const DEFAULT_DB_FILENAME: &str = "daily-dishes.json";
const DEFAULT_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Default)]
pub struct Config(pub HashMap<Parameter, String>);

#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum Parameter {
    Dir,
    DbFilename,
    Storage,
    Address,
    Port,
    Unknown,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StorageKind {
    File,
    Memory,
}

impl Parameter {
    pub fn deserialize(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dir" => Ok(Parameter::Dir),
            "dbfilename" => Ok(Parameter::DbFilename),
            "storage" => Ok(Parameter::Storage),
            "address" => Ok(Parameter::Address),
            "port" => Ok(Parameter::Port),
            _ => Ok(Parameter::Unknown),
        }
    }
}

impl Config {
    /// Load config from `--key value` style arguments (program name excluded).
    pub fn from_args<I>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();
        let mut current_key = None;
        for arg in args {
            if let Some(current_key) = current_key.take() {
                if current_key != Parameter::Unknown {
                    config.0.insert(current_key, arg);
                }
            } else if let Some(key) = arg.strip_prefix("--") {
                current_key = Some(Parameter::deserialize(key)?);
            } else {
                anyhow::bail!("invalid argument {:?}", arg)
            }
        }
        if let Some(key) = current_key {
            anyhow::bail!("missing value for {:?}", key)
        }
        Ok(config)
    }

    fn get(&self, parameter: Parameter) -> Option<&str> {
        self.0.get(&parameter).map(String::as_str)
    }

    /// Location of the persisted daily-dish document.
    pub fn db_path(&self) -> PathBuf {
        let mut p = PathBuf::new();
        p.push(self.get(Parameter::Dir).unwrap_or(DEFAULT_DIR));
        p.push(self.get(Parameter::DbFilename).unwrap_or(DEFAULT_DB_FILENAME));
        p
    }

    pub fn storage(&self) -> anyhow::Result<StorageKind> {
        match self.get(Parameter::Storage).map(str::to_ascii_lowercase).as_deref() {
            None | Some("file") => Ok(StorageKind::File),
            Some("memory") => Ok(StorageKind::Memory),
            Some(other) => anyhow::bail!("invalid storage kind {:?}", other),
        }
    }

    pub fn address(&self) -> anyhow::Result<IpAddr> {
        Ok(self.get(Parameter::Address).unwrap_or(DEFAULT_ADDRESS).parse()?)
    }

    pub fn port(&self) -> anyhow::Result<u16> {
        match self.get(Parameter::Port) {
            Some(port) => Ok(port.parse()?),
            None => Ok(DEFAULT_PORT),
        }
    }
}
