use chrono::Local;
use climagraph_core::{ReportSheet, SavedReport, WeatherSnapshot};

pub fn print_snapshot(snapshot: &WeatherSnapshot) {
    let sheet = ReportSheet::from_snapshot(snapshot, &Local);
    let loc = &sheet.location;
    let c = &sheet.current;

    println!("{}, {} • {}", loc.name, loc.country_code, sheet.date_line);
    println!("{:.4}, {:.4} (source: {})", loc.lat, loc.lon, sheet.provider);
    println!();
    println!("  {:.1}°C  {} ({})", c.temperature_c, c.condition, c.description);
    println!("  Feels like   {:.1}°C", c.feels_like_c);
    println!("  Humidity     {}%", c.humidity_pct);
    println!("  Pressure     {} hPa", c.pressure_hpa);
    println!("  Wind         {:.1} m/s at {}°", c.wind_speed_mps, c.wind_direction_deg);
    println!("  Visibility   {:.1} km", f64::from(c.visibility_m) / 1000.0);
    println!("  Cloudiness   {}%", c.cloudiness_pct);
    println!("  Sunrise      {}", sheet.sunrise_label);
    println!("  Sunset       {}", sheet.sunset_label);
    println!();

    if sheet.chart.is_empty() {
        println!("  No forecast data available.");
        return;
    }

    println!("  Next 24 hours");
    for point in &sheet.chart {
        println!(
            "  {:>8}  {:>4}°C  {:>3}%",
            point.label, point.temperature, point.humidity
        );
    }
}

pub fn print_history(reports: &[SavedReport]) {
    if reports.is_empty() {
        println!("No saved reports. Use `climagraph show <city> --save` to create one.");
        return;
    }

    for report in reports {
        let snap = &report.snapshot;
        println!(
            "{:>14}  {}  {}, {}  {:.1}°C {}",
            report.id.to_string(),
            report.saved_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            snap.location.name,
            snap.location.country_code,
            snap.current.temperature_c,
            snap.current.condition,
        );
    }
}
