//! Example: generate a world and cache it on disk
//!
//! Run with `RUST_LOG=debug` to see per-phase timings. Pass a path to an
//! equirectangular elevation picture to use image-sampled terrain.

use geodesic_conquest::*;

fn main() -> Result<()> {
    env_logger::init();

    println!("Geodesic World Generation Example");
    println!("=================================\n");

    let config = WorldConfigBuilder::new()
        .resolution(4)?
        .terrain_seed(12345)
        .build()?;

    println!("Configuration:");
    println!("  Resolution: {}", config.resolution);
    println!("  Globe cells: {}", config.globe_cell_count());
    println!("  Radius: {}", config.radius);
    println!("  Cache key: {}", config.cache_key());
    println!();

    let reference = std::env::args()
        .nth(1)
        .and_then(geodesic_conquest::session::load_reference);

    let store = JsonFileStore::new(std::env::temp_dir().join("geodesic_conquest"));
    let (world, outcome) = load_or_generate(
        &config,
        &store,
        reference.as_ref().map(|r| r as &dyn BrightnessSampler),
    )?;
    println!("World ready: {} cells ({:?})\n", world.len(), outcome);

    println!("Terrain distribution:");
    for (biome, count) in world.biome_counts() {
        let pct = count as f32 / world.len() as f32 * 100.0;
        println!("  {:<9} {:>6} ({:.1}%)", biome, count, pct);
    }

    let pentagons = world.cells().filter(|c| c.neighbor_count() == 5).count();
    println!("\nPentagons: {}", pentagons);

    println!("\nSample cells:");
    for cell in world.cells().take(5) {
        println!(
            "  {} {}: lat={:.2} lng={:.2} elevation={:.3} {} neighbors={}",
            cell.index,
            cell.id,
            cell.latitude,
            cell.longitude,
            cell.elevation,
            cell.biome,
            cell.neighbor_count()
        );
    }

    let origin = Vec3::new(0.0, 0.0, 5.0);
    let engine = TerritoryEngine::new(world, TerritoryRules::default())?;
    if let Some(hit) = engine.raycast(origin, -origin) {
        println!("\nRay from {:?} hits cell {} at {:?}", origin, hit.cell_index, hit.world_point);
    }

    Ok(())
}
