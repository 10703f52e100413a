use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use sabagram_core::infrastructure::settings::Settings;
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::{RestError, RestResult};

/// Пары `(колонка, выражение)` в синтаксисе PostgREST, например
/// `("post_id", "eq.<uuid>")`.
pub(crate) type Query = Vec<(&'static str, String)>;

#[derive(Debug, Clone)]
/// Параметры подключения к PostgREST.
pub struct PostgrestConfig {
    /// Адрес проекта, например `https://xyz.supabase.co`.
    pub base_url: String,
    /// Публичный ключ проекта, уходит в заголовок `apikey`.
    pub anon_key: String,
    /// Токен пользователя; без него запросы идут от имени анонимного ключа.
    pub access_token: Option<String>,
    /// Таймаут установки соединения.
    pub connect_timeout: Duration,
    /// Таймаут всего запроса.
    pub request_timeout: Duration,
}

impl PostgrestConfig {
    /// Берёт параметры из настроек приложения.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            base_url: settings.supabase_url.clone(),
            anon_key: settings.supabase_anon_key.clone(),
            access_token: settings.supabase_access_token.clone(),
            connect_timeout: Duration::from_secs(settings.http_connect_timeout_secs),
            request_timeout: Duration::from_secs(settings.http_request_timeout_secs),
        }
    }
}

#[derive(Debug, Clone)]
/// Тонкий HTTP-клиент над `/rest/v1` PostgREST.
pub struct PostgrestClient {
    rest_url: String,
    anon_key: String,
    access_token: Option<String>,
    client: Client,
}

impl PostgrestClient {
    /// Создаёт клиент. Адрес может быть как корнем проекта, так и уже
    /// указывать на `/rest/v1`.
    pub fn new(config: PostgrestConfig) -> RestResult<Self> {
        if config.anon_key.trim().is_empty() {
            return Err(RestError::Config("anon key must not be empty".to_string()));
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| RestError::Config(format!("failed to build http client: {err}")))?;

        Ok(Self {
            rest_url: rest_url(&config.base_url),
            anon_key: config.anon_key,
            access_token: config.access_token,
            client,
        })
    }

    /// Переключает клиент на токен пользователя.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Базовый адрес REST API, всегда оканчивается на `/rest/v1`.
    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table.trim_start_matches('/'))
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        self.client
            .request(method, self.endpoint(table))
            .header("apikey", self.anon_key.as_str())
            .bearer_auth(bearer)
    }

    async fn send(&self, request: RequestBuilder) -> RestResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = RestError::from_response(status, &body);
        debug!(status = status.as_u16(), error = %err, "postgrest request failed");
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> RestResult<Vec<T>> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub(crate) async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> RestResult<Vec<T>> {
        let response = self
            .send(self.request(Method::GET, table).query(query))
            .await?;
        Self::decode(response).await
    }

    /// Вставка без возврата строк (`return=minimal`).
    pub(crate) async fn insert<B: Serialize + ?Sized>(&self, table: &str, body: &B) -> RestResult<()> {
        self.send(
            self.request(Method::POST, table)
                .header("Prefer", "return=minimal")
                .json(body),
        )
        .await?;
        Ok(())
    }

    pub(crate) async fn insert_returning<B, T>(
        &self,
        table: &str,
        body: &B,
        columns: &str,
    ) -> RestResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send(
                self.request(Method::POST, table)
                    .header("Prefer", "return=representation")
                    .query(&[("select", columns)])
                    .json(body),
            )
            .await?;
        Self::decode(response).await
    }

    pub(crate) async fn update_returning<B, T>(
        &self,
        table: &str,
        filters: &Query,
        body: &B,
        columns: &str,
    ) -> RestResult<Vec<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send(
                self.request(Method::PATCH, table)
                    .header("Prefer", "return=representation")
                    .query(filters)
                    .query(&[("select", columns)])
                    .json(body),
            )
            .await?;
        Self::decode(response).await
    }

    pub(crate) async fn delete(&self, table: &str, filters: &Query) -> RestResult<()> {
        self.send(self.request(Method::DELETE, table).query(filters))
            .await?;
        Ok(())
    }

    /// Удаляет строки и возвращает их `id`: пустой ответ значит, что под
    /// фильтр ничего не попало.
    pub(crate) async fn delete_returning<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &Query,
    ) -> RestResult<Vec<T>> {
        let response = self
            .send(
                self.request(Method::DELETE, table)
                    .header("Prefer", "return=representation")
                    .query(filters)
                    .query(&[("select", "id")]),
            )
            .await?;
        Self::decode(response).await
    }

    /// Точное число строк через `HEAD` и `Content-Range`.
    pub(crate) async fn count(&self, table: &str, filters: &Query) -> RestResult<u64> {
        let response = self
            .send(
                self.request(Method::HEAD, table)
                    .header("Prefer", "count=exact")
                    .query(filters),
            )
            .await?;

        let header = response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| RestError::Unexpected(format!("{table}: missing content-range")))?;

        content_range_total(header)
            .ok_or_else(|| RestError::Unexpected(format!("{table}: bad content-range '{header}'")))
    }
}

fn rest_url(base_url: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    if base.ends_with("/rest/v1") {
        base.to_string()
    } else {
        format!("{base}/rest/v1")
    }
}

/// Общее число строк из `Content-Range: 0-24/3573` или `*/0`.
fn content_range_total(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

/// Фильтр `in.(a,b,c)` для набора идентификаторов.
pub(crate) fn in_list<I, T>(ids: I) -> String
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    let joined = ids
        .into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("in.({joined})")
}

pub(crate) fn eq<T: std::fmt::Display>(value: T) -> String {
    format!("eq.{value}")
}

/// Фильтр `ilike.*q*`: подстрока без учёта регистра. Символы шаблона из
/// пользовательского ввода выбрасываются.
pub(crate) fn ilike_contains(query: &str) -> String {
    let needle: String = query
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, '*' | '%'))
        .collect();
    format!("ilike.*{needle}*")
}
