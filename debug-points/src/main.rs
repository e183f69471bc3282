use geojson::{Feature, Geometry};
use points_format::Bounds;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        println!("Pass in a points.bin file");
        std::process::exit(1);
    }
    let bytes = std::fs::read(&args[1]).unwrap();
    let points = points_format::read_points(&bytes).unwrap();

    let mut bounds = Bounds::new();
    for point in &points {
        bounds.update(*point);
    }
    println!("{} points", points.len());
    println!(
        "Recomputed bounds: lon {} to {}, lat {} to {}",
        bounds.min_lon, bounds.max_lon, bounds.min_lat, bounds.max_lat
    );

    let mut features = Vec::new();
    for (idx, point) in points.iter().enumerate() {
        let mut f = Feature::from(Geometry::from(geojson::Value::Point(vec![
            point.lon as f64,
            point.lat as f64,
        ])));
        f.set_property("point_id", idx);
        features.push(f);
    }
    let gj = geojson::GeoJson::from(features.into_iter().collect::<geojson::FeatureCollection>());
    std::fs::write("debug.geojson", serde_json::to_string_pretty(&gj).unwrap()).unwrap();
}
