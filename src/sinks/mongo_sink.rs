use crate::config::mongo_config::MongoConfig;
use crate::sinks::csv_sink::{COL_CITY, COL_DATE, COL_LATITUDE, COL_LONGITUDE, COL_STATE};
use crate::sinks::error::SinkError;
use crate::sinks::TableSink;
use crate::types::output_table::OutputTable;
use async_trait::async_trait;
use log::{debug, info};
use mongodb::bson::{self, Bson, Document};
use mongodb::options::{ClientOptions, Credential};
use mongodb::{Client, Collection};

/// Inserts every row of a table as one document into a MongoDB collection.
///
/// Each document carries `date` (a BSON datetime), one field per metric (a double, or null
/// when missing), and the `City`, `State`, `Latitude`, `Longitude` labels. The per-location
/// row index is not stored.
#[derive(Debug, Clone)]
pub struct MongoSink {
    collection: Collection<Document>,
    cluster: String,
}

impl MongoSink {
    /// Opens a client for `mongodb+srv://<cluster>` authenticated with the configured
    /// credentials.
    ///
    /// Credentials are attached as a [`Credential`] instead of being spliced into the
    /// connection string, so usernames and passwords need no percent-encoding.
    pub async fn connect(config: &MongoConfig) -> Result<Self, SinkError> {
        let connect_err = |source| SinkError::Connect {
            cluster: config.cluster.clone(),
            source,
        };

        let mut options = ClientOptions::parse(config.connection_uri())
            .await
            .map_err(connect_err)?;
        options.credential = Some(
            Credential::builder()
                .username(config.username.clone())
                .password(config.password.clone())
                .build(),
        );
        let client = Client::with_options(options).map_err(connect_err)?;
        debug!("Created MongoDB client for cluster {}", config.cluster);

        Ok(Self::from_collection(
            &config.cluster,
            client
                .database(&config.database)
                .collection(&config.collection),
        ))
    }

    /// Wraps a collection from an already configured client. `cluster` only labels logs.
    pub fn from_collection(cluster: &str, collection: Collection<Document>) -> Self {
        Self {
            collection,
            cluster: cluster.to_string(),
        }
    }

    pub fn database(&self) -> String {
        self.collection.namespace().db
    }

    pub fn collection(&self) -> &str {
        self.collection.name()
    }
}

/// Converts every row of the table to a BSON document, preserving row order.
pub fn to_documents(table: &OutputTable) -> Vec<Document> {
    table
        .rows()
        .iter()
        .map(|row| {
            let mut doc = Document::new();
            doc.insert(
                COL_DATE,
                bson::DateTime::from_millis(row.date.timestamp_millis()),
            );
            for (k, metric) in table.metrics().iter().enumerate() {
                let value = row.values.get(k).copied().flatten();
                doc.insert(metric.api_name(), value.map_or(Bson::Null, Bson::Double));
            }
            doc.insert(COL_CITY, row.description.as_str());
            doc.insert(COL_STATE, row.name.as_str());
            doc.insert(COL_LATITUDE, row.latitude);
            doc.insert(COL_LONGITUDE, row.longitude);
            doc
        })
        .collect()
}

#[async_trait]
impl TableSink for MongoSink {
    fn name(&self) -> String {
        format!(
            "mongodb:{}/{}.{}",
            self.cluster,
            self.database(),
            self.collection()
        )
    }

    async fn write(&self, table: &OutputTable) -> Result<usize, SinkError> {
        info!("Writing to MongoDB");
        if table.is_empty() {
            info!("No rows to insert, skipping MongoDB write");
            return Ok(0);
        }

        let documents = to_documents(table);
        let rows = documents.len();
        let result = self
            .collection
            .insert_many(documents)
            .await
            .map_err(|source| SinkError::Insert {
                database: self.database(),
                collection: self.collection().to_string(),
                rows,
                source,
            })?;

        info!(
            "Inserted {} documents into {}.{}",
            result.inserted_ids.len(),
            self.database(),
            self.collection()
        );
        Ok(result.inserted_ids.len())
    }
}
