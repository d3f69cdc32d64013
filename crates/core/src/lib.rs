pub mod app;
pub mod config;
pub mod counter;
pub mod feed;
pub mod fetch;
pub mod observer;
pub mod ranking;
pub mod testing;
pub mod vocabulary;

pub use app::{deadline_token, write_json, AppError, FireflyApp, TopWordsReport};
pub use config::{
    config_path_from_env, load_config, load_config_from_str, validate_config, Config,
    ConfigError, RunConfig, ServerConfig, SourcesConfig,
};
pub use counter::{CounterConfig, CounterError, RunSummary, TokenCounts, WordCounter};
pub use feed::{FeedError, LocatorFeed};
pub use fetch::{DocumentFetcher, FetchConfig, FetchError, HttpFetcher, OriginStatus};
pub use observer::{NoopObserver, PipelineObserver, TracingObserver};
pub use ranking::{select_top, TopWords, WordCount};
pub use vocabulary::{load_vocabulary, TokenValidator, Vocabulary, VocabularyError};
