use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use super::model::Item;
use super::store::MenuStore;

pub const SCANNED_CATEGORY: &str = "Bin Executables";

impl MenuStore {
    /// Moves every executable from `source` into `managed` and adds a menu
    /// item for it. A file whose managed command is already on the menu is
    /// left where it is; an unreferenced managed copy is replaced.
    pub fn scan_directory(&mut self, source: &Path, managed: &Path) -> Vec<Item> {
        if !source.is_dir() {
            return Vec::new();
        }
        let entries = match read_executables(source) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("cannot scan {}: {err}", source.display());
                return Vec::new();
            }
        };
        if let Err(err) = fs::create_dir_all(managed) {
            log::warn!("cannot create {}: {err}", managed.display());
            return Vec::new();
        }

        let mut known_commands: HashSet<String> =
            self.tree().items().map(|item| item.cmd.trim().to_string()).collect();
        let mut added = Vec::new();
        for (path, filename) in entries {
            let dest = managed.join(&filename);
            let cmd = managed_command(managed, &filename);
            if known_commands.contains(&cmd) {
                continue;
            }
            if let Err(err) = move_executable(&path, &dest) {
                log::warn!("skipping {}: {err}", path.display());
                continue;
            }
            log::info!("imported {filename} as {cmd}");
            known_commands.insert(cmd.clone());
            let item = Item::new(
                &filename_to_label(&filename),
                &cmd,
                &format!("Executable: {filename}"),
                SCANNED_CATEGORY,
            );
            self.add_item(item.clone());
            added.push(item);
        }
        added
    }
}

fn read_executables(source: &Path) -> io::Result<Vec<(PathBuf, String)>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || !is_executable_file(&entry) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            found.push((path.clone(), name.to_string()));
        }
    }
    found.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(found)
}

fn move_executable(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_err() {
        // rename cannot cross filesystems
        if to.exists() {
            fs::remove_file(to)?;
        }
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    #[cfg(unix)]
    {
        let mut perms = fs::metadata(to)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(to, perms)?;
    }
    Ok(())
}

fn managed_command(managed: &Path, filename: &str) -> String {
    let full = managed.join(filename);
    if let Some(home) = dirs::home_dir() {
        if let Ok(relative) = full.strip_prefix(&home) {
            return format!("~/{}", relative.display());
        }
    }
    full.display().to_string()
}

/// `my_tool-v2` becomes `My Tool V2`.
pub fn filename_to_label(name: &str) -> String {
    let spaced = name.replace(['_', '-'], " ");
    let mut label = String::with_capacity(spaced.len());
    let mut in_word = false;
    for ch in spaced.chars() {
        if ch.is_alphabetic() {
            if in_word {
                label.extend(ch.to_lowercase());
            } else {
                label.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            label.push(ch);
            in_word = false;
        }
    }
    label
}

fn is_executable_file(entry: &fs::DirEntry) -> bool {
    #[cfg(unix)]
    {
        entry
            .metadata()
            .map(|metadata| metadata.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("exe"))
            .unwrap_or(true)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::menu::storage::memory::MemoryStorage;

    fn write_file(dir: &Path, name: &str, mode: u32) {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\necho hi\n").expect("write");
        let mut perms = fs::metadata(&path).expect("meta").permissions();
        perms.set_mode(mode);
        fs::set_permissions(&path, perms).expect("chmod");
    }

    #[test]
    fn labels_are_title_cased() {
        assert_eq!(filename_to_label("backup_home-dir"), "Backup Home Dir");
        assert_eq!(filename_to_label("mySCRIPT"), "Myscript");
        assert_eq!(filename_to_label("x11_tool"), "X11 Tool");
    }

    #[test]
    fn executables_are_moved_and_added() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let source = tmp.path().join("drop");
        let managed = tmp.path().join("managed");
        fs::create_dir_all(&source).expect("mkdir");
        write_file(&source, "disk_usage", 0o700);
        write_file(&source, "notes.txt", 0o644);

        let storage = MemoryStorage::default();
        let mut store = MenuStore::load(Box::new(storage.clone()));
        let added = store.scan_directory(&source, &managed);

        assert_eq!(added.len(), 1);
        assert_eq!(added[0].label, "Disk Usage");
        assert_eq!(added[0].info, "Executable: disk_usage");
        assert!(added[0].cmd.ends_with("managed/disk_usage"));
        assert!(!source.join("disk_usage").exists());
        assert!(source.join("notes.txt").exists());
        let mode = fs::metadata(managed.join("disk_usage"))
            .expect("moved")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);

        let scanned = store.tree().get(SCANNED_CATEGORY).expect("category");
        assert_eq!(scanned.items, added);
        assert_eq!(storage.writes(), 2);
    }

    #[test]
    fn unreferenced_managed_copy_is_replaced() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let source = tmp.path().join("drop");
        let managed = tmp.path().join("managed");
        fs::create_dir_all(&source).expect("mkdir");
        fs::create_dir_all(&managed).expect("mkdir");
        write_file(&source, "tool", 0o755);
        fs::write(managed.join("tool"), "stale").expect("write");

        let mut store = MenuStore::load(Box::new(MemoryStorage::default()));
        let added = store.scan_directory(&source, &managed);
        assert_eq!(added.len(), 1);
        assert!(!source.join("tool").exists());
        let contents = fs::read_to_string(managed.join("tool")).expect("read");
        assert!(contents.contains("echo hi"));
    }

    #[test]
    fn referenced_command_is_left_in_drop_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let source = tmp.path().join("drop");
        let managed = tmp.path().join("managed");
        fs::create_dir_all(&source).expect("mkdir");
        write_file(&source, "tool", 0o755);

        let mut store = MenuStore::load(Box::new(MemoryStorage::default()));
        store.add_item(Item::new("Tool", &managed_command(&managed, "tool"), "", "Mine"));
        assert!(store.scan_directory(&source, &managed).is_empty());
        assert!(source.join("tool").exists());
        assert!(!store.tree().contains(SCANNED_CATEGORY));
    }

    #[test]
    fn tool_is_reimported_after_its_item_is_deleted() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let source = tmp.path().join("drop");
        let managed = tmp.path().join("managed");
        fs::create_dir_all(&source).expect("mkdir");
        write_file(&source, "tool", 0o755);

        let mut store = MenuStore::load(Box::new(MemoryStorage::default()));
        let first = store.scan_directory(&source, &managed);
        assert_eq!(first.len(), 1);
        assert!(store.delete_item(&first[0]));

        write_file(&source, "tool", 0o755);
        let second = store.scan_directory(&source, &managed);
        assert_eq!(second.len(), 1);
        assert!(!source.join("tool").exists());
        assert_eq!(store.tree().get(SCANNED_CATEGORY).map(|c| c.items.len()), Some(1));
    }

    #[test]
    fn missing_source_yields_nothing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut store = MenuStore::load(Box::new(MemoryStorage::default()));
        let added = store.scan_directory(&tmp.path().join("absent"), &tmp.path().join("m"));
        assert!(added.is_empty());
    }

    #[test]
    fn second_scan_finds_only_new_files() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let source = tmp.path().join("drop");
        let managed = tmp.path().join("managed");
        fs::create_dir_all(&source).expect("mkdir");
        write_file(&source, "one", 0o755);

        let mut store = MenuStore::load(Box::new(MemoryStorage::default()));
        assert_eq!(store.scan_directory(&source, &managed).len(), 1);
        write_file(&source, "two", 0o755);
        let second = store.scan_directory(&source, &managed);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].label, "Two");
        assert_eq!(store.tree().get(SCANNED_CATEGORY).map(|c| c.items.len()), Some(2));
    }
}
