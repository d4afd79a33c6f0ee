use crate::{GlobalPosition, LayeredMap};

/// A solid box of `value` covering `min .. min + shape`. The box is clipped at the end of the `u32` coordinate range.
pub fn filled_box<T>(min: GlobalPosition, shape: [u32; 3], value: T) -> LayeredMap<T>
where
    T: Clone + Default + PartialEq,
{
    let axis = |start: u32, extent: u32| (start..=u32::MAX).take(extent as usize);
    let mut map = LayeredMap::new();
    for z in axis(min.z, shape[2]) {
        for y in axis(min.y, shape[1]) {
            for x in axis(min.x, shape[0]) {
                map.set(GlobalPosition::new(x, y, z), value.clone());
            }
        }
    }
    log::debug!(
        "filled box at {:?} with {} voxels in {} chunks",
        min,
        map.len(),
        map.chunk_count()
    );
    map
}

/// A solid ball of `value`: every position within Euclidean distance `radius` of `center`. Positions that would fall
/// outside the `u32` coordinate range are skipped.
pub fn filled_sphere<T>(center: GlobalPosition, radius: u32, value: T) -> LayeredMap<T>
where
    T: Clone + Default + PartialEq,
{
    let mut map = LayeredMap::new();
    let r = radius as i64;
    let in_range = |c: i64| (0..=u32::MAX as i64).contains(&c);
    for dz in -r..=r {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy + dz * dz > r * r {
                    continue;
                }
                let [x, y, z] = [center.x as i64 + dx, center.y as i64 + dy, center.z as i64 + dz];
                if in_range(x) && in_range(y) && in_range(z) {
                    map.set(GlobalPosition::new(x as u32, y as u32, z as u32), value.clone());
                }
            }
        }
    }
    log::debug!(
        "filled sphere at {:?} with {} voxels in {} chunks",
        center,
        map.len(),
        map.chunk_count()
    );
    map
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
