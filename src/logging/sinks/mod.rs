pub mod console;
pub mod file;

use tracing_subscriber::Layer;

/// Layer, который можно сложить в `Vec` и подключить к registry.
pub type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;
