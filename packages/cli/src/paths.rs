//! Canonical file paths for pipeline inputs and outputs.
//!
//! Everything lives under the project root: raw downloads in `data/raw/`,
//! JSON records in `data/processed/`, `GeoJSON` in `data/geo/` and images
//! in `visuals/`.

use std::path::{Path, PathBuf};

use election_atlas_render::OutputDirs;

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
///
/// # Panics
///
/// Panics if the project root cannot be resolved.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("Failed to find project root from CARGO_MANIFEST_DIR")
        .to_path_buf()
}

/// Returns the `data/raw/` directory.
#[must_use]
pub fn raw_dir() -> PathBuf {
    project_root().join("data").join("raw")
}

/// Returns the `data/processed/` directory.
#[must_use]
pub fn processed_dir() -> PathBuf {
    project_root().join("data").join("processed")
}

/// Renderer output directories.
#[must_use]
pub fn output_dirs() -> OutputDirs {
    let root = project_root();
    OutputDirs {
        visuals: root.join("visuals"),
        geo: root.join("data").join("geo"),
    }
}

/// MIT Election Lab county returns, 2000–2020.
#[must_use]
pub fn mit_csv() -> PathBuf {
    raw_dir().join("countypres_2000-2020.csv")
}

/// Scraped 2024 county results.
#[must_use]
pub fn county_results_2024() -> PathBuf {
    processed_dir().join("presidential_county_results_2024.json")
}

/// Processed county results for every year.
#[must_use]
pub fn county_results() -> PathBuf {
    processed_dir().join("presidential_county_results.json")
}

/// County change between two years.
#[must_use]
pub fn county_change(from: u16, to: u16) -> PathBuf {
    processed_dir().join(format!("presidential_county_change_{from}_{to}.json"))
}

/// State results for every scraped year, as JSON.
#[must_use]
pub fn states_json() -> PathBuf {
    processed_dir().join("presidential_results_states_all.json")
}

/// State results for every scraped year, as CSV.
#[must_use]
pub fn states_csv() -> PathBuf {
    processed_dir().join("presidential_results_states_all.csv")
}

/// County population for one census year.
#[must_use]
pub fn census_population(year: u16) -> PathBuf {
    processed_dir().join(format!("county_population_census_{year}.json"))
}

/// County results with population attached.
#[must_use]
pub fn county_results_with_population() -> PathBuf {
    processed_dir().join("presidential_county_results_with_population.json")
}

/// Per-year metrics.
#[must_use]
pub fn metrics() -> PathBuf {
    processed_dir().join("election_metrics_by_year.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_sit_under_project_root() {
        let root = project_root();
        assert!(root.join("Cargo.toml").exists());
        assert!(county_results().starts_with(root.join("data/processed")));
        assert!(mit_csv().ends_with("data/raw/countypres_2000-2020.csv"));
        assert!(output_dirs().geo.ends_with("data/geo"));
    }

    #[test]
    fn year_paths_embed_years() {
        assert!(county_change(2016, 2020).ends_with("presidential_county_change_2016_2020.json"));
        assert!(census_population(2010).ends_with("county_population_census_2010.json"));
    }
}
