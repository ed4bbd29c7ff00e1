//! Physical device (GPU) selection.
//!
//! A GPU is suitable when it exposes a graphics queue family, a family that
//! can present to the target surface, the swapchain extension, and at least
//! one surface format and present mode. Among suitable GPUs the highest
//! score wins; discrete GPUs are strongly preferred.

use ash::vk;
use tracing::{debug, info, warn};

use crate::error::RhiError;
use crate::swapchain::SwapchainSupportDetails;

/// Queue family indices discovered while probing a device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics_family: Option<u32>,
    pub present_family: Option<u32>,
}

impl QueueFamilyIndices {
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.graphics_family.is_some() && self.present_family.is_some()
    }

    /// Returns the resolved families once both are known.
    pub fn resolve(&self) -> Option<QueueFamilies> {
        Some(QueueFamilies {
            graphics: self.graphics_family?,
            present: self.present_family?,
        })
    }
}

/// Resolved graphics and present queue families of the selected device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilies {
    /// Distinct family indices, graphics first.
    pub fn unique(&self) -> Vec<u32> {
        if self.graphics == self.present {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

/// Everything needed to create the logical device.
#[derive(Clone)]
pub struct PhysicalDeviceInfo {
    pub device: vk::PhysicalDevice,
    pub properties: vk::PhysicalDeviceProperties,
    pub features: vk::PhysicalDeviceFeatures,
    pub queue_families: QueueFamilies,
}

impl PhysicalDeviceInfo {
    pub fn device_name(&self) -> &str {
        self.properties
            .device_name_as_c_str()
            .ok()
            .and_then(|name| name.to_str().ok())
            .unwrap_or("Unknown Device")
    }

    pub fn device_type_name(&self) -> &'static str {
        match self.properties.device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => "Discrete GPU",
            vk::PhysicalDeviceType::INTEGRATED_GPU => "Integrated GPU",
            vk::PhysicalDeviceType::VIRTUAL_GPU => "Virtual GPU",
            vk::PhysicalDeviceType::CPU => "CPU",
            _ => "Other",
        }
    }

    /// Whether `PolygonMode::LINE` pipelines can be built on this device.
    #[inline]
    pub fn supports_wireframe(&self) -> bool {
        self.features.fill_mode_non_solid == vk::TRUE
    }
}

impl std::fmt::Debug for PhysicalDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicalDeviceInfo")
            .field("name", &self.device_name())
            .field("type", &self.device_type_name())
            .field("queue_families", &self.queue_families)
            .finish()
    }
}

/// Selects the most suitable GPU for rendering to `surface`.
///
/// # Errors
///
/// Returns [`RhiError::NoSuitableGpu`] if no GPU meets the requirements, or
/// a Vulkan error if enumeration fails.
pub fn select_physical_device(
    instance: &ash::Instance,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Result<PhysicalDeviceInfo, RhiError> {
    let devices = unsafe { instance.enumerate_physical_devices()? };

    if devices.is_empty() {
        warn!("No Vulkan-capable GPUs found");
        return Err(RhiError::NoSuitableGpu);
    }

    info!("Found {} GPU(s)", devices.len());

    let selected = devices
        .into_iter()
        .filter_map(|device| check_device_suitability(instance, device, surface, surface_loader))
        .map(|info| {
            let score = rate_device(&info.properties);
            debug!(
                "GPU '{}' ({}) - score {}",
                info.device_name(),
                info.device_type_name(),
                score
            );
            (info, score)
        })
        .max_by_key(|(_, score)| *score);

    let Some((info, score)) = selected else {
        warn!("No suitable GPU found with required capabilities");
        return Err(RhiError::NoSuitableGpu);
    };

    info!(
        "Selected GPU: '{}' ({}), score {}, wireframe {}",
        info.device_name(),
        info.device_type_name(),
        score,
        if info.supports_wireframe() { "supported" } else { "unsupported" }
    );

    Ok(info)
}

fn check_device_suitability(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Option<PhysicalDeviceInfo> {
    let properties = unsafe { instance.get_physical_device_properties(device) };
    let features = unsafe { instance.get_physical_device_features(device) };
    let name = properties
        .device_name_as_c_str()
        .ok()
        .and_then(|name| name.to_str().ok())
        .unwrap_or("Unknown");

    let indices = find_queue_families(instance, device, surface, surface_loader);
    let Some(queue_families) = indices.resolve() else {
        debug!(
            "GPU '{}' skipped: missing queue families (graphics={}, present={})",
            name,
            indices.graphics_family.is_some(),
            indices.present_family.is_some()
        );
        return None;
    };

    if !supports_swapchain_extension(instance, device) {
        debug!("GPU '{}' skipped: VK_KHR_swapchain not supported", name);
        return None;
    }

    match SwapchainSupportDetails::query(device, surface, surface_loader) {
        Ok(support) if support.is_adequate() => {}
        _ => {
            debug!("GPU '{}' skipped: inadequate swapchain support", name);
            return None;
        }
    }

    Some(PhysicalDeviceInfo {
        device,
        properties,
        features,
        queue_families,
    })
}

fn supports_swapchain_extension(instance: &ash::Instance, device: vk::PhysicalDevice) -> bool {
    let Ok(extensions) = (unsafe { instance.enumerate_device_extension_properties(device) }) else {
        return false;
    };

    extensions.iter().any(|ext| {
        ext.extension_name_as_c_str()
            .is_ok_and(|name| name == ash::khr::swapchain::NAME)
    })
}

/// Prefers a single family that does both graphics and present.
fn find_queue_families(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> QueueFamilyIndices {
    let families = unsafe { instance.get_physical_device_queue_family_properties(device) };

    let flags: Vec<(vk::QueueFlags, bool)> = families
        .iter()
        .enumerate()
        .map(|(i, family)| {
            let present = family.queue_count > 0
                && unsafe {
                    surface_loader
                        .get_physical_device_surface_support(device, i as u32, surface)
                        .unwrap_or(false)
                };
            let flags = if family.queue_count > 0 {
                family.queue_flags
            } else {
                vk::QueueFlags::empty()
            };
            (flags, present)
        })
        .collect();

    pick_queue_families(&flags)
}

/// Pure selection over `(queue_flags, can_present)` per family.
fn pick_queue_families(families: &[(vk::QueueFlags, bool)]) -> QueueFamilyIndices {
    let graphics = |flags: &vk::QueueFlags| flags.contains(vk::QueueFlags::GRAPHICS);

    if let Some(i) = families
        .iter()
        .position(|(flags, present)| graphics(flags) && *present)
    {
        return QueueFamilyIndices {
            graphics_family: Some(i as u32),
            present_family: Some(i as u32),
        };
    }

    QueueFamilyIndices {
        graphics_family: families
            .iter()
            .position(|(flags, _)| graphics(flags))
            .map(|i| i as u32),
        present_family: families
            .iter()
            .position(|(_, present)| *present)
            .map(|i| i as u32),
    }
}

fn rate_device(properties: &vk::PhysicalDeviceProperties) -> u32 {
    let type_score = match properties.device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 10_000,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 1_000,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 100,
        vk::PhysicalDeviceType::CPU => 10,
        _ => 1,
    };

    type_score + properties.limits.max_image_dimension2_d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_family_indices_resolve() {
        let indices = QueueFamilyIndices::default();
        assert!(!indices.is_complete());
        assert!(indices.resolve().is_none());

        let indices = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(2),
        };
        assert_eq!(
            indices.resolve(),
            Some(QueueFamilies {
                graphics: 0,
                present: 2
            })
        );
    }

    #[test]
    fn test_unique_families() {
        let same = QueueFamilies {
            graphics: 1,
            present: 1,
        };
        assert_eq!(same.unique(), vec![1]);

        let split = QueueFamilies {
            graphics: 0,
            present: 3,
        };
        assert_eq!(split.unique(), vec![0, 3]);
    }

    #[test]
    fn test_pick_prefers_combined_family() {
        let families = [
            (vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE, false),
            (vk::QueueFlags::TRANSFER, true),
            (vk::QueueFlags::GRAPHICS, true),
        ];
        let indices = pick_queue_families(&families);
        assert_eq!(indices.graphics_family, Some(2));
        assert_eq!(indices.present_family, Some(2));
    }

    #[test]
    fn test_pick_split_families() {
        let families = [
            (vk::QueueFlags::GRAPHICS, false),
            (vk::QueueFlags::TRANSFER, true),
        ];
        let indices = pick_queue_families(&families);
        assert_eq!(indices.graphics_family, Some(0));
        assert_eq!(indices.present_family, Some(1));
    }

    #[test]
    fn test_pick_without_present() {
        let families = [(vk::QueueFlags::GRAPHICS, false)];
        assert!(!pick_queue_families(&families).is_complete());
    }

    #[test]
    fn test_discrete_gpu_outranks_integrated() {
        let mut discrete = vk::PhysicalDeviceProperties::default();
        discrete.device_type = vk::PhysicalDeviceType::DISCRETE_GPU;
        let mut integrated = vk::PhysicalDeviceProperties::default();
        integrated.device_type = vk::PhysicalDeviceType::INTEGRATED_GPU;
        integrated.limits.max_image_dimension2_d = 8192;

        assert!(rate_device(&discrete) > rate_device(&integrated));
    }
}
