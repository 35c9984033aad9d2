mod url;

pub use url::{
    ClickData, ClickEvent, CreateUrlRequest, CreateUrlResponse, ShortLink, StatsResponse,
    UrlRecord, UNKNOWN,
};
