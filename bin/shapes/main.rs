use stratum::{shapes, views, Config, GlobalPosition, LayeredMap};

fn main() -> Result<(), ron::Error> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::read_file(&path)?,
        None => Config::default(),
    };
    log::info!("{:?}", config);

    let mut cube = shapes::filled_box(GlobalPosition::from(config.box_min), config.box_shape, 1u8);
    let mut ball = shapes::filled_sphere(GlobalPosition::from(config.sphere_center), config.sphere_radius, 2u8);
    log::info!(
        "box: {} voxels in {} chunks, sphere: {} voxels in {} chunks",
        cube.len(),
        cube.chunk_count(),
        ball.len(),
        ball.chunk_count()
    );

    report("overlap", LayeredMap::overlap(&cube, &ball));
    report("subtract", LayeredMap::subtract(&cube, &ball));
    report("merge", &cube | views::merge(&ball));
    report("exclusive", &cube | views::exclusive(&ball));

    let carved: LayeredMap<u8> = LayeredMap::subtract(&cube, &ball).map(|(p, v)| (p, *v)).collect();
    log::info!("carved box: {} voxels in {} chunks", carved.len(), carved.chunk_count());

    let stats = cube.compact(&config.compaction);
    log::debug!("box compaction: {:?}", stats);
    let stats = ball.compact(&config.compaction);
    log::debug!("sphere compaction: {:?}", stats);

    Ok(())
}

fn report<'a>(name: &str, view: impl Iterator<Item = (GlobalPosition, &'a u8)>) {
    println!("{:>10}: {}", name, view.count());
}
