use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    config::{Credentials, Settings},
    error::Result,
    spotify,
    types::PkceToken,
};

pub async fn auth(settings: &Settings, shared_state: Arc<Mutex<Option<PkceToken>>>) -> Result<()> {
    let credentials = Credentials::from_env()?;
    spotify::auth::auth(credentials, &settings.data_dir, shared_state).await
}
