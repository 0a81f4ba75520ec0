use std::{
    fs::OpenOptions,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Utc};

use crate::{
    catalog::CatalogItem,
    date::DateKey,
    error::Error,
    store::{DishMap, Store},
};

pub fn read_dish_file<P>(path: P) -> Result<DishMap, Error>
where
    P: Into<PathBuf>,
{
    let data = std::fs::read(path.into())?;
    decode_dishes(&data)
}

/// Replace the document at `path`. The new content goes to a uniquely named
/// file beside it and is renamed into place, so readers never observe a
/// half-written document even with several writers on the same path.
pub fn write_dish_file<P>(dishes: &DishMap, path: P) -> Result<(), Error>
where
    P: Into<PathBuf>,
{
    let path = path.into();
    let buf = encode_dishes(dishes)?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&buf)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&path).map_err(|e| e.error)?;
    Ok(())
}

fn decode_dishes(data: &[u8]) -> Result<DishMap, Error> {
    Ok(serde_json::from_slice(data)?)
}

fn encode_dishes(dishes: &DishMap) -> Result<BytesMut, Error> {
    let mut writer = BytesMut::with_capacity(512).writer();
    serde_json::to_writer_pretty(&mut writer, dishes)?;
    Ok(writer.into_inner())
}

/// Durable backing: one pretty-printed JSON document shared by every process
/// pointed at the same path. Each read goes back to disk.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Prepare the data directory and make sure the document can be written.
    pub fn open<P>(path: P) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().to_path_buf();
        Self::prepare(&path).map_err(Error::into_storage)?;
        Ok(FileStore {
            path,
            write_lock: Mutex::new(()),
        })
    }

    fn prepare(path: &Path) -> Result<(), Error> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        if path.exists() {
            OpenOptions::new().append(true).open(path)?;
        } else {
            write_dish_file(&DishMap::new(), path)?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> DishMap {
        match read_dish_file(&self.path) {
            Ok(dishes) => dishes,
            Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => DishMap::new(),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "unreadable dish file, treating as empty"
                );
                DishMap::new()
            }
        }
    }
}

impl Store for FileStore {
    fn get(&self, date: &DateKey) -> Option<CatalogItem> {
        self.load().remove(date)
    }

    fn set(&self, date: DateKey, item: CatalogItem) -> Result<(), Error> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut dishes = self.load();
        dishes.insert(date, item);
        write_dish_file(&dishes, &self.path).map_err(Error::into_storage)
    }

    fn get_all(&self) -> DishMap {
        self.load()
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        let modified = std::fs::metadata(&self.path).ok()?.modified().ok()?;
        Some(DateTime::<Utc>::from(modified))
    }
}
