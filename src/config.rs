use stratum_map::CompactionConfig;

use serde::{Deserialize, Serialize};

/// Parameters of the shapes demo scene.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Config {
    pub box_min: [u32; 3],
    pub box_shape: [u32; 3],
    pub sphere_center: [u32; 3],
    pub sphere_radius: u32,
    pub compaction: CompactionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            box_min: [0; 3],
            box_shape: [10; 3],
            sphere_center: [5; 3],
            sphere_radius: 3,
            compaction: CompactionConfig::default(),
        }
    }
}

impl Config {
    pub fn read_file(path: &str) -> Result<Self, ron::Error> {
        let reader = std::fs::File::open(path)?;

        ron::de::from_reader(reader)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn parse_scene() {
        let text = "(
            box_min: (1, 2, 3),
            box_shape: (4, 4, 4),
            sphere_center: (3, 4, 5),
            sphere_radius: 2,
            compaction: (min_dead_ratio: 0.25, shrink_planes: false),
        )";
        let config: Config = ron::de::from_str(text).unwrap();
        assert_eq!(config.box_min, [1, 2, 3]);
        assert_eq!(config.sphere_radius, 2);
        assert_relative_eq!(config.compaction.min_dead_ratio, 0.25);
        assert!(!config.compaction.shrink_planes);
    }

    #[test]
    fn default_survives_serialization() {
        let text = ron::ser::to_string(&Config::default()).unwrap();
        let config: Config = ron::de::from_str(&text).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::read_file("does/not/exist.ron").is_err());
    }
}
