use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};

use crate::{SupabaseClient, SupabaseError};

/// PostgREST query against a single table.
///
/// Only equality filters are supported; that is all the profile tables need.
pub struct TableQuery<'a> {
    client: &'a SupabaseClient,
    table: String,
    select: Option<String>,
    filters: Vec<(String, String)>,
}

impl SupabaseClient {
    pub fn from(&self, table: impl Into<String>) -> TableQuery<'_> {
        TableQuery {
            client: self,
            table: table.into(),
            select: None,
            filters: Vec::new(),
        }
    }

    /// Call a Postgres function exposed through PostgREST.
    #[tracing::instrument(name = "rest::rpc", skip(self, args))]
    pub async fn rpc<A, T>(&self, function: &str, args: &A) -> Result<T, SupabaseError>
    where
        A: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(&format!("rest/v1/rpc/{function}"))?;
        let builder = self.request(Method::POST, url).json(args);

        self.send(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|e| SupabaseError::Parsing(format!("Failed to parse rpc response: {e}")))
    }
}

impl<'a> TableQuery<'a> {
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.select = Some(columns.into());
        self
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.filters
            .push((column.into(), format!("eq.{}", value.as_ref())));
        self
    }

    fn url(&self) -> Result<url::Url, SupabaseError> {
        let mut url = self.client.endpoint(&format!("rest/v1/{}", self.table))?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(select) = &self.select {
                pairs.append_pair("select", select);
            }
            for (column, filter) in &self.filters {
                pairs.append_pair(column, filter);
            }
        }
        Ok(url)
    }

    /// Fetch all matching rows.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, SupabaseError> {
        let builder = self.client.request(Method::GET, self.url()?);

        self.client
            .send(builder)
            .await?
            .json::<Vec<T>>()
            .await
            .map_err(|e| SupabaseError::Parsing(format!("Failed to parse rows of {}: {e}", self.table)))
    }

    /// Fetch the first matching row, if any.
    pub async fn maybe_single<T: DeserializeOwned>(self) -> Result<Option<T>, SupabaseError> {
        Ok(self.fetch::<T>().await?.into_iter().next())
    }

    /// Patch all matching rows and return how many were changed.
    pub async fn update<B: Serialize + ?Sized>(self, body: &B) -> Result<usize, SupabaseError> {
        let builder = self
            .client
            .request(Method::PATCH, self.url()?)
            .header("Prefer", "return=representation")
            .json(body);

        let rows = self
            .client
            .send(builder)
            .await?
            .json::<Vec<serde_json::Value>>()
            .await
            .map_err(|e| SupabaseError::Parsing(format!("Failed to parse update of {}: {e}", self.table)))?;

        Ok(rows.len())
    }

    /// Insert one row (or an array of rows).
    pub async fn insert<B: Serialize + ?Sized>(self, body: &B) -> Result<(), SupabaseError> {
        let builder = self
            .client
            .request(Method::POST, self.url()?)
            .header("Prefer", "return=minimal")
            .json(body);

        self.client.send(builder).await?;
        Ok(())
    }
}
