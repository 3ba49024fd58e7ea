use log::info;
use mongodb::{options::ClientOptions, Client, Database};

/// Connection handle, built once in `main` and handed to the stores.
pub struct MongoDB {
    pub client: Client,
    pub db: Database,
}

impl MongoDB {
    pub async fn connect(uri: &str, db_name: &str) -> mongodb::error::Result<Self> {
        let mut client_options = ClientOptions::parse(uri).await?;
        client_options.app_name = Some("project_hub".to_string());
        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);
        info!("Connected to MongoDB database {}", db_name);
        Ok(MongoDB { client, db })
    }

    /// Waits for in-flight operations and closes the pool.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        info!("MongoDB connection closed");
    }
}
