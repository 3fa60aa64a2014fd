//! Example: grow a territory from a capital with time-gated conquest

use geodesic_conquest::*;

fn main() -> Result<()> {
    env_logger::init();

    println!("=== Conquest Demo ===\n");

    let config = SessionConfig {
        world: WorldConfigBuilder::new().resolution(3)?.terrain_seed(7).build()?,
        rules: TerritoryRules::time_gated(ConquestTiming::default())?,
        starting_troops: 1000,
        ..Default::default()
    };
    let (mut session, outcome) = Session::start(config, &MemoryStore::new(), None)?;
    println!("World: {} cells ({:?})", session.engine().world().len(), outcome);

    session.subscribe(Box::new(|event: &TerritoryEvent| match event {
        TerritoryEvent::CapitalPlaced { cell, name } => println!("  founded {} on cell {}", name, cell),
        TerritoryEvent::ConquestCompleted { cell, elapsed } => {
            println!("  cell {} taken after {:.1}s", cell, elapsed)
        }
        _ => {}
    }));

    let world = session.engine().world();
    let capital = match (0..world.len()).find(|&i| !world.is_water(i)) {
        Some(cell) => world.centers()[cell],
        None => {
            println!("No land on this world");
            return Ok(());
        }
    };
    if let Err(err) = session.place_capital(capital) {
        println!("Capital rejected: {}", err);
        return Ok(());
    }

    let dt = 0.25;
    for _ in 0..200 {
        if session.engine().active_claim().is_none() {
            let target = session.engine().frontier().first().copied();
            match target {
                Some(cell) => {
                    let point = session.engine().world().centers()[cell];
                    let troops = session.troops().min(150);
                    if let Err(err) = session.request_expansion(point, troops) {
                        println!("  request on cell {} rejected: {}", cell, err);
                    }
                }
                None => break,
            }
        }
        session.tick(dt);
    }

    println!("\nTerritory: {} cells", session.engine().territory_size());
    println!("Troops left: {}", session.troops());
    println!("Cash: {}", session.cash());

    println!("\n=== Demo Complete ===");
    Ok(())
}
