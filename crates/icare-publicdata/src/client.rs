//! HTTP client for the data.go.kr XML APIs.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use percent_encoding::percent_decode_str;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::PublicDataError;
use crate::retry::retry_with_backoff;
use crate::types::{
    DepartmentItem, DrugInfo, DrugItem, Envelope, HospitalBasisItem, HospitalDetailItem, Page,
    PharmacyItem,
};

const DEFAULT_BASE_URL: &str = "http://apis.data.go.kr/";
const PHARMACY_FULL_DOWN: &str = "B552657/ErmctInsttInfoInqireService/getParmacyFullDown";
const HOSPITAL_BASIS: &str = "B551182/hospInfoServicev2/getHospBasisList";
const HOSPITAL_DETAIL: &str = "B551182/MadmDtlInfoService2.7/getDtlInfo2.7";
const HOSPITAL_DEPARTMENTS: &str = "B551182/MadmDtlInfoService2.7/getDgsbjtInfo2.7";
const DRUG_EASY_INFO: &str = "1471000/DrbEasyDrugInfoService/getDrbEasyDrugList";

const SUCCESS_CODE: &str = "00";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 500;
/// Pages fetched concurrently by [`PublicDataClient::fetch_all_pharmacies`].
const PAGE_CONCURRENCY: usize = 4;

/// Client for one data.go.kr service key.
///
/// Use [`PublicDataClient::new`] for production or
/// [`PublicDataClient::with_base_url`] to point at a mock server.
#[derive(Debug, Clone)]
pub struct PublicDataClient {
    client: Client,
    service_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl PublicDataClient {
    /// # Errors
    ///
    /// Returns [`PublicDataError::Http`] if the `reqwest::Client` cannot be
    /// constructed.
    pub fn new(service_key: &str, timeout_secs: u64) -> Result<Self, PublicDataError> {
        Self::with_base_url(service_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`PublicDataError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`PublicDataError::InvalidBaseUrl`] if `base_url` does
    /// not parse.
    pub fn with_base_url(
        service_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, PublicDataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("icare/0.1 (facility-hours)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalised).map_err(|_| PublicDataError::InvalidBaseUrl(normalised))?;

        Ok(Self {
            client,
            service_key: decode_service_key(service_key),
            base_url,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// One page of the nationwide pharmacy list.
    ///
    /// # Errors
    ///
    /// Returns [`PublicDataError`] on HTTP, API or decode failure.
    pub async fn fetch_pharmacy_page(
        &self,
        page: u32,
        rows: u32,
    ) -> Result<Page<PharmacyItem>, PublicDataError> {
        let (page_no, num_rows) = (page.to_string(), rows.to_string());
        self.get_page(
            PHARMACY_FULL_DOWN,
            &[("pageNo", &page_no), ("numOfRows", &num_rows)],
        )
        .await
    }

    /// Every pharmacy, walking pages sized `rows_per_page`.
    ///
    /// The first page supplies `totalCount`; a later page that fails is
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`PublicDataError`] if the first page cannot be fetched.
    pub async fn fetch_all_pharmacies(
        &self,
        rows_per_page: u32,
    ) -> Result<Vec<PharmacyItem>, PublicDataError> {
        let rows_per_page = rows_per_page.max(1);
        let first = self.fetch_pharmacy_page(1, rows_per_page).await?;
        let total_pages =
            u32::try_from(first.total_count.div_ceil(u64::from(rows_per_page))).unwrap_or(u32::MAX);
        tracing::info!(
            total_count = first.total_count,
            total_pages,
            "pharmacy download: starting"
        );

        let mut items = first.items;
        let rest: Vec<Vec<PharmacyItem>> = stream::iter(2..=total_pages)
            .map(|page| async move {
                match self.fetch_pharmacy_page(page, rows_per_page).await {
                    Ok(p) => p.items,
                    Err(e) => {
                        tracing::warn!(page, error = %e, "pharmacy download: page failed, skipping");
                        Vec::new()
                    }
                }
            })
            .buffered(PAGE_CONCURRENCY)
            .collect()
            .await;
        items.extend(rest.into_iter().flatten());

        tracing::info!(count = items.len(), "pharmacy download: finished");
        Ok(items)
    }

    /// One page of hospitals in a province (`sidoCd`).
    ///
    /// # Errors
    ///
    /// Returns [`PublicDataError`] on HTTP, API or decode failure.
    pub async fn fetch_hospital_basis_page(
        &self,
        sido_code: &str,
        page: u32,
        rows: u32,
    ) -> Result<Page<HospitalBasisItem>, PublicDataError> {
        let (page_no, num_rows) = (page.to_string(), rows.to_string());
        self.get_page(
            HOSPITAL_BASIS,
            &[
                ("pageNo", &page_no),
                ("numOfRows", &num_rows),
                ("sidoCd", sido_code),
            ],
        )
        .await
    }

    /// Opening hours and holiday notes for one hospital; `None` when the API
    /// has no detail record.
    ///
    /// # Errors
    ///
    /// Returns [`PublicDataError`] on HTTP, API or decode failure.
    pub async fn fetch_hospital_detail(
        &self,
        ykiho: &str,
    ) -> Result<Option<HospitalDetailItem>, PublicDataError> {
        let page: Page<HospitalDetailItem> =
            self.get_page(HOSPITAL_DETAIL, &[("ykiho", ykiho)]).await?;
        Ok(page.items.into_iter().next())
    }

    /// # Errors
    ///
    /// Returns [`PublicDataError`] on HTTP, API or decode failure.
    pub async fn fetch_hospital_departments(
        &self,
        ykiho: &str,
    ) -> Result<Vec<DepartmentItem>, PublicDataError> {
        let page: Page<DepartmentItem> = self
            .get_page(HOSPITAL_DEPARTMENTS, &[("ykiho", ykiho)])
            .await?;
        Ok(page.items)
    }

    /// Looks up drugs whose product name contains `item_name`.
    ///
    /// # Errors
    ///
    /// Returns [`PublicDataError`] on HTTP, API or decode failure.
    pub async fn search_drugs(
        &self,
        item_name: &str,
        rows: u32,
    ) -> Result<Vec<DrugInfo>, PublicDataError> {
        let num_rows = rows.to_string();
        let page: Page<DrugItem> = self
            .get_page(
                DRUG_EASY_INFO,
                &[
                    ("itemName", item_name),
                    ("pageNo", "1"),
                    ("numOfRows", &num_rows),
                    ("type", "xml"),
                ],
            )
            .await?;
        Ok(page.items.into_iter().map(DrugInfo::from).collect())
    }

    fn build_url(&self, path: &str, extra: &[(&str, &str)]) -> Result<Url, PublicDataError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|_| PublicDataError::InvalidBaseUrl(format!("{}{path}", self.base_url)))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("serviceKey", &self.service_key);
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Page<T>, PublicDataError> {
        let url = self.build_url(path, params)?;
        let body = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.request_text(&url)
        })
        .await?;
        parse_page(&body, path)
    }

    async fn request_text(&self, url: &Url) -> Result<String, PublicDataError> {
        let response = self.client.get(url.clone()).send().await?;
        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Keys copied from the portal's "encoding" field arrive percent-encoded;
/// decode once so the query builder does not encode them twice.
fn decode_service_key(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains('%') {
        percent_decode_str(trimmed).decode_utf8_lossy().into_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Decodes an envelope and checks `resultCode`.
pub(crate) fn parse_page<T: DeserializeOwned>(
    body: &str,
    context: &str,
) -> Result<Page<T>, PublicDataError> {
    let envelope: Envelope<T> =
        quick_xml::de::from_str(body).map_err(|source| PublicDataError::Xml {
            context: context.to_owned(),
            source,
        })?;

    if envelope.header.result_code.trim() != SUCCESS_CODE {
        return Err(PublicDataError::Api {
            code: envelope.header.result_code,
            message: envelope.header.result_msg,
        });
    }

    Ok(envelope.body.map_or_else(
        || Page {
            items: Vec::new(),
            total_count: 0,
        },
        |body| Page {
            items: body.items.map(|i| i.item).unwrap_or_default(),
            total_count: body.total_count,
        },
    ))
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
