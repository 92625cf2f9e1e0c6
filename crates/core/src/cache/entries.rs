//! Entry CRUD operations.
//!
//! Provides functions for storing, reading, listing and deleting cached
//! responses within a partition.

use super::connection::CacheDb;
use super::key::RequestKey;
use crate::Error;
use crate::http::{HeaderList, Response};
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A captured response plus the identity it was stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub key: RequestKey,
    pub url: String,
    pub status: u16,
    pub headers: HeaderList,
    pub body: Bytes,
    pub stored_at: i64,
}

impl StoredEntry {
    pub fn new(key: RequestKey, url: impl Into<String>, response: &Response, stored_at: i64) -> Self {
        Self {
            key,
            url: url.into(),
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
            stored_at,
        }
    }

    /// Replay as a response.
    pub fn to_response(&self) -> Response {
        Response { status: self.status, headers: self.headers.clone(), body: self.body.clone() }
    }
}

/// Entry metadata without the body, for sweeps and pattern clears.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    pub key_hash: String,
    pub request_key: String,
    pub action: Option<String>,
    pub headers: HeaderList,
    pub stored_at: i64,
}

impl CacheDb {
    /// Insert or overwrite an entry.
    ///
    /// The partition is created if missing, mirroring how opening a named
    /// cache creates it on first use.
    pub async fn put_entry(&self, partition: &str, entry: &StoredEntry) -> Result<(), Error> {
        let partition = partition.to_string();
        let key_hash = entry.key.hash();
        let request_key = entry.key.canonical().to_string();
        let action = entry.key.action().map(str::to_string);
        let url = entry.url.clone();
        let status = entry.status;
        let headers_json = serde_json::to_string(&entry.headers)?;
        let body = entry.body.to_vec();
        let stored_at = entry.stored_at;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO partitions (name, created_at) VALUES (?1, ?2)
                     ON CONFLICT(name) DO NOTHING",
                    params![partition, stored_at],
                )?;
                tx.execute(
                    "INSERT INTO entries (
                        partition, key_hash, request_key, action, url, status, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(partition, key_hash) DO UPDATE SET
                        request_key = excluded.request_key,
                        action = excluded.action,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![partition, key_hash, request_key, action, url, status, headers_json, body, stored_at],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry by key.
    ///
    /// Returns None if the partition has no entry for the key.
    pub async fn get_entry(&self, partition: &str, key: &RequestKey) -> Result<Option<StoredEntry>, Error> {
        let partition = partition.to_string();
        let key_hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<StoredEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT request_key, action, url, status, headers_json, body, stored_at
                     FROM entries WHERE partition = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![partition, key_hash], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, u16>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Vec<u8>>(5)?,
                        row.get::<_, i64>(6)?,
                    ))
                });

                match result {
                    Ok((request_key, action, url, status, headers_json, body, stored_at)) => {
                        let headers: HeaderList = serde_json::from_str(&headers_json)?;
                        Ok(Some(StoredEntry {
                            key: RequestKey::from_parts(request_key, action),
                            url,
                            status,
                            headers,
                            body: Bytes::from(body),
                            stored_at,
                        }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one entry by key hash.
    pub async fn delete_entry(&self, partition: &str, key_hash: &str) -> Result<bool, Error> {
        let partition = partition.to_string();
        let key_hash = key_hash.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE partition = ?1 AND key_hash = ?2",
                    params![partition, key_hash],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// List entry metadata in a partition, oldest first.
    ///
    /// Rows whose headers cannot be decoded come back with an empty header
    /// list so freshness checks see them as malformed.
    pub async fn entry_metas(&self, partition: &str) -> Result<Vec<EntryMeta>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<EntryMeta>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key_hash, request_key, action, headers_json, stored_at
                     FROM entries WHERE partition = ?1 ORDER BY stored_at ASC",
                )?;
                let rows = stmt
                    .query_map(params![partition], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, i64>(4)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(rows
                    .into_iter()
                    .map(|(key_hash, request_key, action, headers_json, stored_at)| EntryMeta {
                        key_hash,
                        request_key,
                        action,
                        headers: serde_json::from_str(&headers_json).unwrap_or_default(),
                        stored_at,
                    })
                    .collect())
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in a partition.
    pub async fn count_entries(&self, partition: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE partition = ?1", params![partition], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
