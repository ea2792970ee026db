use std::{
    error, fmt, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::Utc;
use model::preferences::{Preferences, Theme};
use tokio::sync::{watch, Mutex};

#[derive(Debug, Clone)]
pub enum PreferenceError {
    Io(Arc<io::Error>),
    Json(Arc<serde_json::Error>),
}

impl error::Error for PreferenceError {}

impl fmt::Display for PreferenceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Could not access preferences: {}", e),
            Self::Json(e) => write!(f, "Invalid preferences file: {}", e),
        }
    }
}

impl From<io::Error> for PreferenceError {
    fn from(e: io::Error) -> Self {
        Self::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for PreferenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(Arc::new(e))
    }
}

struct StoreInner {
    path: Option<PathBuf>,
    sender: watch::Sender<Preferences>,
    write: Mutex<()>,
}

/// The one place the dark/light preference lives. Open it once at startup and
/// hand out clones; every clone observes the same value.
#[derive(Clone)]
pub struct PreferenceStore {
    inner: Arc<StoreInner>,
}

impl PreferenceStore {
    fn with_initial(path: Option<PathBuf>, preferences: Preferences) -> Self {
        let (sender, _) = watch::channel(preferences);
        Self {
            inner: Arc::new(StoreInner {
                path,
                sender,
                write: Mutex::new(()),
            }),
        }
    }

    /// A store that forgets everything on exit.
    pub fn in_memory() -> Self {
        Self::with_initial(None, Preferences::default())
    }

    /// Loads the preferences stored at `path`. A missing file yields the
    /// defaults, it is created on the first change.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self, PreferenceError> {
        let path = path.into();
        let preferences = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(why) if why.kind() == io::ErrorKind::NotFound => Preferences::default(),
            Err(why) => return Err(why.into()),
        };
        log::debug!("loaded preferences from {}", path.display());
        Ok(Self::with_initial(Some(path), preferences))
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    pub fn get(&self) -> Preferences {
        self.inner.sender.borrow().clone()
    }

    pub fn theme(&self) -> Theme {
        self.inner.sender.borrow().theme
    }

    /// Notified after every change.
    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.inner.sender.subscribe()
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<Preferences, PreferenceError> {
        self.update(|_| theme).await
    }

    pub async fn toggle_theme(&self) -> Result<Preferences, PreferenceError> {
        self.update(Theme::toggled).await
    }

    async fn update<F>(&self, change: F) -> Result<Preferences, PreferenceError>
    where
        F: FnOnce(Theme) -> Theme,
    {
        let _guard = self.inner.write.lock().await;
        let current = self.get();
        let preferences = Preferences {
            theme: change(current.theme),
            updated_at: Some(Utc::now()),
        };
        if let Some(path) = &self.inner.path {
            persist(path, &preferences).await?;
        }
        self.inner.sender.send_replace(preferences.clone());
        log::info!("theme set to {:?}", preferences.theme);
        Ok(preferences)
    }
}

/// Writes to a sibling file first so readers never see half a file.
async fn persist(path: &Path, preferences: &Preferences) -> Result<(), PreferenceError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let temporary = path.with_extension("json.tmp");
    tokio::fs::write(&temporary, serde_json::to_vec_pretty(preferences)?).await?;
    tokio::fs::rename(&temporary, path).await?;
    Ok(())
}
