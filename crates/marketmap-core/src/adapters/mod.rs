mod yahoo;

pub use yahoo::YahooChartSource;
