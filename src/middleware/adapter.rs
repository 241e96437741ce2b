use crate::configuration::Options;
use crate::error::SpiderError;
use crate::item::{Item, Outcome, ParseOutput};
use crate::request::Request;
use crate::response::Response;

use super::{DownloaderMiddleware, ResponseMiddleware};

/// A downloader middleware pinned into the downloader chain.
pub struct DownloaderMiddlewareAdapter {
    name: String,
    options: Options,
    middleware: Box<dyn DownloaderMiddleware>,
}

impl DownloaderMiddlewareAdapter {
    pub fn from_middleware(
        name: impl Into<String>,
        options: Options,
        middleware: Box<dyn DownloaderMiddleware>,
    ) -> Self {
        Self {
            name: name.into(),
            options,
            middleware,
        }
    }

    /// The identifier the unit was resolved from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The options the unit was configured with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub async fn handle_request(&self, request: Request) -> Result<Outcome<Request>, SpiderError> {
        self.middleware.handle_request(request).await
    }

    pub async fn handle_response(
        &self,
        response: Response,
        output: &mut ParseOutput,
    ) -> Result<Outcome<Response>, SpiderError> {
        self.middleware.handle_response(response, output).await
    }
}

/// A response middleware pinned into the response chain.
pub struct ResponseMiddlewareAdapter {
    name: String,
    options: Options,
    middleware: Box<dyn ResponseMiddleware>,
}

impl ResponseMiddlewareAdapter {
    pub fn from_middleware(
        name: impl Into<String>,
        options: Options,
        middleware: Box<dyn ResponseMiddleware>,
    ) -> Self {
        Self {
            name: name.into(),
            options,
            middleware,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub async fn handle_response(
        &self,
        response: Response,
        output: &mut ParseOutput,
    ) -> Result<Outcome<Response>, SpiderError> {
        self.middleware.handle_response(response, output).await
    }

    pub async fn handle_item(
        &self,
        item: Item,
        response: &Response,
    ) -> Result<Outcome<Item>, SpiderError> {
        self.middleware.handle_item(item, response).await
    }

    pub async fn handle_request(
        &self,
        request: Request,
        response: &Response,
    ) -> Result<Outcome<Request>, SpiderError> {
        self.middleware.handle_request(request, response).await
    }
}

impl std::fmt::Debug for DownloaderMiddlewareAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloaderMiddlewareAdapter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for ResponseMiddlewareAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseMiddlewareAdapter")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
