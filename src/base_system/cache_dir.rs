//! 下载缓存目录的作用域管理。
//!
//! 进入时创建目录。同一路径上的守卫在进程内共享计数：最后一个守卫释放时，
//! 仅当目录由这一批守卫中的第一个创建且仍为空才删除，已下载的文件不会被清理。

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};

use tracing::debug;

#[derive(Debug, Default)]
struct Slot {
    active: usize,
    created: bool,
}

static ACTIVE: OnceLock<Mutex<HashMap<PathBuf, Slot>>> = OnceLock::new();

fn active_slots() -> MutexGuard<'static, HashMap<PathBuf, Slot>> {
    ACTIVE
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

pub fn is_empty_dir(path: impl AsRef<Path>) -> io::Result<bool> {
    let path = path.as_ref();
    let mut entries = fs::read_dir(path)?;
    Ok(entries.next().is_none())
}

#[derive(Debug)]
pub struct CacheDir {
    path: PathBuf,
}

impl CacheDir {
    pub fn acquire(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        // 持锁完成“是否已存在”的判断与创建
        let mut slots = active_slots();
        let first = !slots.contains_key(&path);
        let created = first && !path.exists();
        fs::create_dir_all(&path)?;
        if created {
            debug!("创建缓存目录: {}", path.display());
        }

        let slot = slots.entry(path.clone()).or_default();
        if first {
            slot.created = created;
        }
        slot.active += 1;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CacheDir {
    fn drop(&mut self) {
        let mut slots = active_slots();
        let Some(slot) = slots.get_mut(&self.path) else {
            return;
        };
        slot.active -= 1;
        if slot.active > 0 {
            return;
        }
        let created = slot.created;
        slots.remove(&self.path);
        if !created {
            return;
        }
        if let Ok(true) = is_empty_dir(&self.path) {
            match fs::remove_dir(&self.path) {
                Ok(()) => debug!("已清理空缓存目录: {}", self.path.display()),
                Err(e) => debug!("清理缓存目录失败(忽略): {}", e),
            }
        }
    }
}
