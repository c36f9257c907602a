//! SVG figures for the paper, drawn from stored observations

use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

use crate::catalog::NATIONAL;
use crate::db::{DbError, ObservationFilter, ObservationRepository};

pub type Series = Vec<(i32, f64)>;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 550;
const DEREGULATION: (i32, &str) = (2000, "Deregulation");

const BLUE: RGBColor = RGBColor(0x15, 0x65, 0xc0);
const RED: RGBColor = RGBColor(0xc6, 0x28, 0x28);
const GREEN: RGBColor = RGBColor(0x2e, 0x7d, 0x32);
const ORANGE: RGBColor = RGBColor(0xe6, 0x51, 0x00);
const CHARCOAL: RGBColor = RGBColor(0x21, 0x21, 0x21);
const BUTTER: RGBColor = RGBColor(0xf9, 0xa8, 0x25);
const CHEESE: RGBColor = RGBColor(0x5d, 0x40, 0x37);
const MARKER: RGBColor = RGBColor(0x9e, 0x9e, 0x9e);

/// Colour used for a region in every figure
pub fn region_colour(code: &str) -> RGBColor {
    match code {
        "VIC" => RGBColor(0x1b, 0x5e, 0x20),
        "NSW" => RGBColor(0x0d, 0x47, 0xa1),
        "QLD" => RGBColor(0xb7, 0x1c, 0x1c),
        "SA" => RGBColor(0xe6, 0x51, 0x00),
        "WA" => RGBColor(0x4a, 0x14, 0x8c),
        "TAS" => RGBColor(0x00, 0x60, 0x64),
        _ => CHARCOAL,
    }
}

/// States drawn individually, largest producer first
const STATES: [&str; 6] = ["VIC", "NSW", "QLD", "TAS", "SA", "WA"];

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("No data for figure {0}")]
    NoData(String),
}

fn render_err<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Render(e.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Primary,
    Secondary,
}

#[derive(Debug, Clone)]
pub struct SeriesSpec {
    pub label: String,
    pub variable_id: &'static str,
    pub region: &'static str,
    /// Stored values are divided by this before plotting
    pub divisor: f64,
    pub colour: RGBColor,
    pub axis: Axis,
}

fn line(label: &str, variable_id: &'static str, divisor: f64, colour: RGBColor) -> SeriesSpec {
    SeriesSpec {
        label: label.to_string(),
        variable_id,
        region: NATIONAL,
        divisor,
        colour,
        axis: Axis::Primary,
    }
}

fn secondary(spec: SeriesSpec) -> SeriesSpec {
    SeriesSpec {
        axis: Axis::Secondary,
        ..spec
    }
}

#[derive(Debug, Clone)]
pub enum FigureKind {
    Lines {
        series: Vec<SeriesSpec>,
        secondary_label: Option<&'static str>,
    },
    /// Stacked percentage share of the national total
    RegionShares {
        variable_id: &'static str,
        regions: Vec<&'static str>,
    },
}

#[derive(Debug, Clone)]
pub struct FigureSpec {
    /// File stem, e.g. "fig1_production_herd"
    pub name: &'static str,
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub kind: FigureKind,
    /// Vertical markers at (year, label)
    pub events: Vec<(i32, &'static str)>,
}

pub fn figures() -> Vec<FigureSpec> {
    let fy = "Financial year starting";
    vec![
        FigureSpec {
            name: "fig1_production_herd",
            title: "Milk production and the milking herd",
            x_label: fy,
            y_label: "Milk production (megalitres)",
            kind: FigureKind::Lines {
                series: vec![
                    line("Milk production (ML)", "prod_milk_total", 1.0, BLUE),
                    secondary(line("Dairy cows ('000)", "herd_dairy_cows", 1000.0, RED)),
                ],
                secondary_label: Some("Dairy cows ('000 head)"),
            },
            events: vec![DEREGULATION],
        },
        FigureSpec {
            name: "fig2_yield_per_cow",
            title: "Average milk yield per cow",
            x_label: fy,
            y_label: "Litres per cow per year",
            kind: FigureKind::Lines {
                series: vec![line("Yield per cow", "herd_yield_per_cow", 1.0, GREEN)],
                secondary_label: None,
            },
            events: vec![DEREGULATION],
        },
        FigureSpec {
            name: "fig3_farmgate_prices",
            title: "Farmgate milk prices: the two-price system and deregulation",
            x_label: fy,
            y_label: "Cents per litre (nominal)",
            kind: FigureKind::Lines {
                series: vec![
                    line("Market milk (liquid)", "price_farmgate_market", 1.0, BLUE),
                    line("Manufacturing milk", "price_farmgate_manufacturing", 1.0, ORANGE),
                    line("Weighted average", "price_farmgate_avg", 1.0, CHARCOAL),
                ],
                secondary_label: None,
            },
            events: vec![DEREGULATION],
        },
        FigureSpec {
            name: "fig4_state_shares",
            title: "State shares of Australian milk production",
            x_label: fy,
            y_label: "Share of national milk production (%)",
            kind: FigureKind::RegionShares {
                variable_id: "prod_milk_total",
                regions: STATES.to_vec(),
            },
            events: vec![DEREGULATION],
        },
        FigureSpec {
            name: "fig5_dairy_cattle_states",
            title: "Dairy cattle numbers by state",
            x_label: "Calendar year",
            y_label: "Dairy cattle ('000 head)",
            kind: FigureKind::Lines {
                series: STATES
                    .iter()
                    .map(|&state| SeriesSpec {
                        label: state.to_string(),
                        variable_id: "herd_dairy_cattle",
                        region: state,
                        divisor: 1000.0,
                        colour: region_colour(state),
                        axis: Axis::Primary,
                    })
                    .collect(),
                secondary_label: None,
            },
            events: vec![DEREGULATION],
        },
        FigureSpec {
            name: "fig6_butter_cheese",
            title: "Butter and cheese production",
            x_label: fy,
            y_label: "Production ('000 tonnes)",
            kind: FigureKind::Lines {
                series: vec![
                    line("Butter", "prod_butter", 1000.0, BUTTER),
                    line("Cheese", "prod_cheese", 1000.0, CHEESE),
                ],
                secondary_label: None,
            },
            events: vec![DEREGULATION],
        },
        FigureSpec {
            name: "fig7_consumption",
            title: "Per capita consumption of milk, cheese and butter",
            x_label: fy,
            y_label: "Litres per person",
            kind: FigureKind::Lines {
                series: vec![
                    line("Fluid milk (L, left axis)", "cons_milk_percap", 1.0, BLUE),
                    secondary(line("Cheese (kg, right axis)", "cons_cheese_percap", 1.0, CHEESE)),
                    secondary(line("Butter (kg, right axis)", "cons_butter_percap", 1.0, BUTTER)),
                ],
                secondary_label: Some("Kilograms per person"),
            },
            events: vec![],
        },
        FigureSpec {
            name: "fig8_export_prices",
            title: "Export unit values for butter and cheese",
            x_label: fy,
            y_label: "Cents per kilogram (nominal)",
            kind: FigureKind::Lines {
                series: vec![
                    line("Butter export price", "price_export_butter", 1.0, BUTTER),
                    line("Cheese export price", "price_export_cheese", 1.0, CHEESE),
                ],
                secondary_label: None,
            },
            events: vec![DEREGULATION],
        },
        FigureSpec {
            name: "fig9_total_cattle_longrun",
            title: "Australian cattle numbers, 1860-2022",
            x_label: "Year",
            y_label: "Millions of head",
            kind: FigureKind::Lines {
                series: vec![
                    line("Total cattle", "herd_total_cattle", 1e6, CHARCOAL),
                    line("Dairy cattle", "herd_dairy_cattle", 1e6, RED),
                ],
                secondary_label: None,
            },
            events: vec![
                (1901, "Federation"),
                (1942, "WWII peak"),
                (1973, "UK joins EEC"),
                DEREGULATION,
            ],
        },
    ]
}

/// Each region's percentage of `total` for every year `total` covers
///
/// Years a region does not report count as zero.
pub fn region_shares(total: &Series, parts: &[(&'static str, Series)]) -> Vec<(&'static str, Series)> {
    parts
        .iter()
        .map(|(region, series)| {
            let by_year: BTreeMap<i32, f64> = series.iter().copied().collect();
            let shares = total
                .iter()
                .filter(|(_, national)| *national != 0.0)
                .map(|&(year, national)| {
                    let part = by_year.get(&year).copied().unwrap_or(0.0);
                    (year, part / national * 100.0)
                })
                .collect();
            (*region, shares)
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct ChartReport {
    pub rendered: Vec<PathBuf>,
    pub skipped: Vec<(String, String)>,
}

/// Renders every figure into one output directory
pub struct ChartRenderer {
    observations: ObservationRepository,
    output_dir: PathBuf,
}

impl ChartRenderer {
    pub fn new(pool: SqlitePool, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            observations: ObservationRepository::new(pool),
            output_dir: output_dir.into(),
        }
    }

    /// Render all figures; a failing figure is logged and the rest continue
    #[instrument(skip(self), fields(output_dir = %self.output_dir.display()))]
    pub async fn render_all(&self) -> Result<ChartReport, ChartError> {
        std::fs::create_dir_all(&self.output_dir)?;
        let mut report = ChartReport::default();

        for figure in figures() {
            match self.render(&figure).await {
                Ok(path) => {
                    info!("  {}", path.display());
                    report.rendered.push(path);
                }
                Err(ChartError::NoData(name)) => {
                    warn!("Skipping {}: no data", name);
                    report.skipped.push((name, "no data".to_string()));
                }
                Err(e) => {
                    error!(figure = figure.name, error = %e, "Failed to render figure");
                    report.skipped.push((figure.name.to_string(), e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Render one figure to `<output_dir>/<name>.svg`
    pub async fn render(&self, figure: &FigureSpec) -> Result<PathBuf, ChartError> {
        let path = self.output_dir.join(format!("{}.svg", figure.name));

        match &figure.kind {
            FigureKind::Lines {
                series,
                secondary_label,
            } => {
                let mut loaded = Vec::with_capacity(series.len());
                for spec in series {
                    let points = self.load_series(spec.variable_id, spec.region, spec.divisor).await?;
                    loaded.push((spec.clone(), points));
                }
                if loaded.iter().all(|(_, points)| points.is_empty()) {
                    return Err(ChartError::NoData(figure.name.to_string()));
                }
                draw_lines(&path, figure, &loaded, *secondary_label)?;
            }
            FigureKind::RegionShares {
                variable_id,
                regions,
            } => {
                let total = self.load_series(variable_id, NATIONAL, 1.0).await?;
                if total.is_empty() {
                    return Err(ChartError::NoData(figure.name.to_string()));
                }
                let mut parts = Vec::with_capacity(regions.len());
                for &region in regions {
                    parts.push((region, self.load_series(variable_id, region, 1.0).await?));
                }
                draw_shares(&path, figure, &region_shares(&total, &parts))?;
            }
        }

        Ok(path)
    }

    /// One variable/region series in year order, divided by `divisor`
    pub async fn load_series(
        &self,
        variable_id: &str,
        region: &str,
        divisor: f64,
    ) -> Result<Series, ChartError> {
        let observations = self
            .observations
            .query(&ObservationFilter::variable(variable_id).region(region))
            .await?;
        debug!(
            "Loaded {} points for {}/{}",
            observations.len(),
            variable_id,
            region
        );
        Ok(observations
            .into_iter()
            .map(|o| (o.year, o.value / divisor))
            .collect())
    }
}

fn year_range<'a>(series: impl Iterator<Item = &'a Series>) -> Range<i32> {
    let years: Vec<i32> = series.flat_map(|s| s.iter().map(|(year, _)| *year)).collect();
    let min = years.iter().copied().min().unwrap_or(2000);
    let max = years.iter().copied().max().unwrap_or(2000);
    min..(max + 1).max(min + 1)
}

fn value_range<'a>(series: impl Iterator<Item = &'a Series>) -> Range<f64> {
    let values: Vec<f64> = series.flat_map(|s| s.iter().map(|(_, v)| *v)).collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min).min(0.0);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let max = if max.is_finite() && max > min { max * 1.1 } else { min + 1.0 };
    min..max
}

fn draw_lines(
    path: &Path,
    figure: &FigureSpec,
    loaded: &[(SeriesSpec, Series)],
    secondary_label: Option<&str>,
) -> Result<(), ChartError> {
    let on = |axis: Axis| loaded.iter().filter(move |(spec, _)| spec.axis == axis).map(|(_, s)| s);

    let x_range = year_range(loaded.iter().map(|(_, s)| s));
    let y_range = value_range(on(Axis::Primary));
    let y2_range = value_range(on(Axis::Secondary));

    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(figure.title, ("sans-serif", 20))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(75)
        .right_y_label_area_size(if secondary_label.is_some() { 75 } else { 0 })
        .build_cartesian_2d(x_range.clone(), y_range.clone())
        .map_err(render_err)?
        .set_secondary_coord(x_range.clone(), y2_range);

    chart
        .configure_mesh()
        .x_desc(figure.x_label)
        .y_desc(figure.y_label)
        .draw()
        .map_err(render_err)?;

    if let Some(label) = secondary_label {
        chart
            .configure_secondary_axes()
            .y_desc(label)
            .draw()
            .map_err(render_err)?;
    }

    for (spec, points) in loaded {
        let colour = spec.colour;
        let style = colour.stroke_width(2);
        let series = LineSeries::new(points.iter().copied(), style);
        let annotation = match spec.axis {
            Axis::Primary => chart.draw_series(series).map_err(render_err)?,
            Axis::Secondary => chart.draw_secondary_series(series).map_err(render_err)?,
        };
        annotation
            .label(spec.label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], colour.stroke_width(2)));
    }

    for &(year, label) in &figure.events {
        if !x_range.contains(&year) {
            continue;
        }
        chart
            .draw_series(DashedLineSeries::new(
                vec![(year, y_range.start), (year, y_range.end)],
                3,
                4,
                MARKER.stroke_width(1),
            ))
            .map_err(render_err)?;
        chart
            .draw_series(std::iter::once(Text::new(
                label.to_string(),
                (year, y_range.end * 0.97),
                ("sans-serif", 12).into_font().color(&MARKER),
            )))
            .map_err(render_err)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.9))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

fn draw_shares(
    path: &Path,
    figure: &FigureSpec,
    shares: &[(&'static str, Series)],
) -> Result<(), ChartError> {
    let x_range = year_range(shares.iter().map(|(_, s)| s));

    let root = SVGBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(figure.title, ("sans-serif", 20))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(75)
        .build_cartesian_2d(x_range.clone(), 0.0..100.0)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc(figure.x_label)
        .y_desc(figure.y_label)
        .draw()
        .map_err(render_err)?;

    // Running totals per year; each layer's top edge is the sum of itself and the layers below
    let mut stacked: Vec<(&'static str, Series)> = Vec::with_capacity(shares.len());
    let mut running: BTreeMap<i32, f64> = BTreeMap::new();
    for (region, series) in shares {
        let top: Series = series
            .iter()
            .map(|&(year, share)| {
                let total = running.entry(year).or_insert(0.0);
                *total += share;
                (year, *total)
            })
            .collect();
        stacked.push((region, top));
    }

    // Topmost layer first so lower layers paint over it
    for (region, top) in stacked.iter().rev() {
        let colour = region_colour(region);
        chart
            .draw_series(
                AreaSeries::new(top.iter().copied(), 0.0, colour.mix(0.7).filled())
                    .border_style(colour),
            )
            .map_err(render_err)?
            .label(*region)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], colour.filled()));
    }

    for &(year, _) in &figure.events {
        if x_range.contains(&year) {
            chart
                .draw_series(LineSeries::new(
                    vec![(year, 0.0), (year, 100.0)],
                    WHITE.stroke_width(1),
                ))
                .map_err(render_err)?;
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.9))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_shares_are_percentages_of_total() {
        let total = vec![(2000, 200.0), (2001, 100.0)];
        let parts = vec![("VIC", vec![(2000, 100.0), (2001, 60.0)]), ("TAS", vec![(2000, 20.0)])];

        let shares = region_shares(&total, &parts);

        assert_eq!(shares[0], ("VIC", vec![(2000, 50.0), (2001, 60.0)]));
        assert_eq!(shares[1], ("TAS", vec![(2000, 10.0), (2001, 0.0)]));
    }

    #[test]
    fn test_every_figure_plots_catalogued_variables() {
        for figure in figures() {
            let variables: Vec<&str> = match &figure.kind {
                FigureKind::Lines { series, .. } => series.iter().map(|s| s.variable_id).collect(),
                FigureKind::RegionShares { variable_id, .. } => vec![*variable_id],
            };
            for variable_id in variables {
                assert!(crate::catalog::variable(variable_id).is_some(), "{variable_id}");
            }
        }
        assert_eq!(figures().len(), 9);
    }

    #[test]
    fn test_ranges_never_empty() {
        let empty: Vec<Series> = vec![];
        assert!(!year_range(empty.iter()).is_empty());
        assert!(value_range(empty.iter()).start < value_range(empty.iter()).end);
    }
}
