//! Classification rule tables for the raw feeds.
//!
//! Device ownership is decided from brand tokens in the sensor name before
//! metric tokens in the label. Order inside each table is significant: the
//! first matching rule decides the category of a reading.

use super::classifier::{Pred, Rule, RuleTable};
use super::reading::{Category, SensorKind};

/// GPU brand tokens as they appear in shared-memory sensor group names,
/// e.g. `GPU [#0]: NVIDIA GeForce RTX 3080:`.
const SHM_GPU_OWNER: Pred = Pred::Either(&[
    Pred::Contains(&["radeon", "geforce", "nvidia", "rtx", "gtx", "arc", "rx "]),
    Pred::StartsWith("rx"),
]);

const SHM_CPU_OWNER: Pred = Pred::Contains(&["ryzen", "cpu"]);

/// Rules for readings exported through the shared-memory segment.
pub const SHARED_MEMORY_RULES: RuleTable = RuleTable {
    name: "shared-memory",
    rules: &[
        // Frame rate usually lives in its own sensor group, so no ownership test.
        Rule {
            kind: None,
            name: Pred::Any,
            label: Pred::Either(&[
                Pred::Contains(&["framerate", "fullscreen fps"]),
                Pred::Equals("fps"),
            ]),
            category: Category::Fps,
        },
        // Temperatures
        Rule {
            kind: Some(SensorKind::Temperature),
            name: Pred::Contains(&["ryzen"]),
            label: Pred::Contains(&["tctl"]),
            category: Category::CpuTemp,
        },
        Rule {
            kind: Some(SensorKind::Temperature),
            name: SHM_GPU_OWNER,
            label: Pred::Contains(&["gpu"]),
            category: Category::GpuTemp,
        },
        Rule {
            kind: Some(SensorKind::Temperature),
            name: Pred::Both(&[SHM_GPU_OWNER, Pred::Contains(&["gpu"])]),
            label: Pred::Any,
            category: Category::GpuTemp,
        },
        Rule {
            kind: Some(SensorKind::Temperature),
            name: Pred::Any,
            label: Pred::Contains(&["cpu", "package"]),
            category: Category::CpuTemp,
        },
        // Clocks: CPU first so APU names carrying "Radeon" keep their core clocks.
        Rule {
            kind: Some(SensorKind::Clock),
            name: SHM_CPU_OWNER,
            label: Pred::Contains(&["core"]),
            category: Category::CpuClock,
        },
        Rule {
            kind: Some(SensorKind::Clock),
            name: SHM_GPU_OWNER,
            label: Pred::Contains(&["gpu", "core"]),
            category: Category::GpuClock,
        },
        // Fans
        Rule {
            kind: Some(SensorKind::Fan),
            name: Pred::Any,
            label: Pred::Contains(&["cpu", "pump"]),
            category: Category::CpuFan,
        },
        Rule {
            kind: Some(SensorKind::Fan),
            name: SHM_GPU_OWNER,
            label: Pred::Contains(&["gpu", "fan"]),
            category: Category::GpuFan,
        },
        // Usage
        Rule {
            kind: Some(SensorKind::Usage),
            name: SHM_GPU_OWNER,
            label: Pred::Contains(&["fan"]),
            category: Category::GpuFanPercent,
        },
        Rule {
            kind: Some(SensorKind::Usage),
            name: SHM_GPU_OWNER,
            label: Pred::Either(&[
                Pred::ContainsAll(&["gpu", "core"]),
                Pred::Contains(&["d3d 3d"]),
            ]),
            category: Category::GpuUsage,
        },
        // Power
        Rule {
            kind: Some(SensorKind::Power),
            name: SHM_GPU_OWNER,
            label: Pred::Contains(&["gpu power", "gpu ppt", "total board power", "asic power"]),
            category: Category::GpuPower,
        },
        // Memory
        Rule {
            kind: Some(SensorKind::Other),
            name: SHM_GPU_OWNER,
            label: Pred::Contains(&["memory allocated", "memory used", "memory dedicated"]),
            category: Category::GpuMemUsed,
        },
        Rule {
            kind: Some(SensorKind::Other),
            name: SHM_GPU_OWNER,
            label: Pred::Contains(&["memory total", "memory size"]),
            category: Category::GpuMemTotal,
        },
    ],
};

/// Parent identifiers in the instrumentation namespace look like
/// `/amdcpu/0`, `/intelcpu/0`, `/gpu-nvidia/0` or `/gpu-intel/0`.
const NS_GPU_OWNER: Pred = Pred::Contains(&["gpu", "radeon", "geforce"]);
const NS_CPU_OWNER: Pred = Pred::Contains(&["cpu", "ryzen", "intel"]);

/// Rules for readings from the instrumentation namespace.
///
/// GPU ownership is tested before CPU ownership because Intel GPU parents
/// also carry the `intel` token.
pub const NAMESPACE_RULES: RuleTable = RuleTable {
    name: "instrumentation",
    rules: &[
        // Temperatures
        Rule {
            kind: Some(SensorKind::Temperature),
            name: Pred::Any,
            label: Pred::Contains(&["tctl", "tdie"]),
            category: Category::CpuTemp,
        },
        Rule {
            kind: Some(SensorKind::Temperature),
            name: Pred::Any,
            label: Pred::ContainsAll(&["gpu", "core"]),
            category: Category::GpuTemp,
        },
        Rule {
            kind: Some(SensorKind::Temperature),
            name: NS_GPU_OWNER,
            label: Pred::Contains(&["core"]),
            category: Category::GpuTemp,
        },
        Rule {
            kind: Some(SensorKind::Temperature),
            name: NS_CPU_OWNER,
            label: Pred::Contains(&["core", "package"]),
            category: Category::CpuTemp,
        },
        // Clocks
        Rule {
            kind: Some(SensorKind::Clock),
            name: Pred::Any,
            label: Pred::ContainsAll(&["gpu", "core"]),
            category: Category::GpuClock,
        },
        Rule {
            kind: Some(SensorKind::Clock),
            name: NS_GPU_OWNER,
            label: Pred::Contains(&["core"]),
            category: Category::GpuClock,
        },
        Rule {
            kind: Some(SensorKind::Clock),
            name: NS_CPU_OWNER,
            label: Pred::Contains(&["core"]),
            category: Category::CpuClock,
        },
        // Fans, with unlabelled board fans falling back to the CPU slot
        Rule {
            kind: Some(SensorKind::Fan),
            name: Pred::Any,
            label: Pred::Contains(&["cpu"]),
            category: Category::CpuFan,
        },
        Rule {
            kind: Some(SensorKind::Fan),
            name: Pred::Any,
            label: Pred::Contains(&["gpu"]),
            category: Category::GpuFan,
        },
        Rule {
            kind: Some(SensorKind::Fan),
            name: NS_GPU_OWNER,
            label: Pred::Any,
            category: Category::GpuFan,
        },
        Rule {
            kind: Some(SensorKind::Fan),
            name: NS_CPU_OWNER,
            label: Pred::Any,
            category: Category::CpuFan,
        },
        Rule {
            kind: Some(SensorKind::Fan),
            name: Pred::Any,
            label: Pred::Contains(&["fan"]),
            category: Category::CpuFan,
        },
        // Load
        Rule {
            kind: Some(SensorKind::Usage),
            name: Pred::Any,
            label: Pred::ContainsAll(&["gpu", "core"]),
            category: Category::GpuUsage,
        },
        Rule {
            kind: Some(SensorKind::Usage),
            name: NS_GPU_OWNER,
            label: Pred::Contains(&["core"]),
            category: Category::GpuUsage,
        },
        // Power
        Rule {
            kind: Some(SensorKind::Power),
            name: NS_GPU_OWNER,
            label: Pred::Contains(&["package", "gpu power", "total", "board"]),
            category: Category::GpuPower,
        },
        // SmallData (MB)
        Rule {
            kind: Some(SensorKind::Other),
            name: NS_GPU_OWNER,
            label: Pred::Contains(&["gpu memory used", "dedicated memory used"]),
            category: Category::GpuMemUsed,
        },
        Rule {
            kind: Some(SensorKind::Other),
            name: NS_GPU_OWNER,
            label: Pred::Contains(&["gpu memory total"]),
            category: Category::GpuMemTotal,
        },
    ],
};
