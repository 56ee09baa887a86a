use anyhow::{anyhow, Result};
use log::info;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Read;
use std::path::PathBuf;

/// Session identity of the local user. The `user_id` here is what the store
/// authorizes message deletion against.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
}

impl Profile {
    pub fn new(user_id: &str, display_name: &str) -> Self {
        Profile {
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("devths-chat");

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn save_profile(profile: &Profile) -> Result<()> {
    let profile_path = get_profile_path()?;
    let file = File::create(profile_path)?;
    serde_json::to_writer_pretty(file, profile)?;

    info!("Profile saved for {}", profile.display_name);
    Ok(())
}

pub fn load_profile() -> Result<Option<Profile>> {
    let profile_path = get_profile_path()?;

    if !profile_path.exists() {
        return Ok(None);
    }

    let profile_path_str = profile_path.display().to_string();

    let mut file = File::open(profile_path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let profile: Profile = serde_json::from_str(&contents)?;
    info!(
        "Loaded profile for {} from {}",
        profile.display_name, profile_path_str
    );

    Ok(Some(profile))
}

static PROFILE_PATH_OVERRIDE: OnceCell<PathBuf> = OnceCell::new();

/// Point profile storage somewhere other than the platform config dir.
/// Used by tests to stay out of the real one.
pub fn set_profile_path_override(path: PathBuf) {
    let _ = PROFILE_PATH_OVERRIDE.set(path);
}

fn get_profile_path() -> Result<PathBuf> {
    if let Some(path) = PROFILE_PATH_OVERRIDE.get() {
        return Ok(path.clone());
    }
    Ok(get_config_dir()?.join("profile.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_round_trips_through_json_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        set_profile_path_override(dir.path().join("profile.json"));

        assert_eq!(load_profile().expect("load"), None);

        let profile = Profile::new("user1", "나");
        save_profile(&profile).expect("save");
        assert_eq!(load_profile().expect("load"), Some(profile));
    }
}
