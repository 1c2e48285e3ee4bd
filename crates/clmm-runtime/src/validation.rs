use crate::{device::DeviceProperties, dispatch::WorkDescriptor, error::WorkSizeError};

/// Validate the extents of a work descriptor, and the work group size against the hardware
/// limits when they are known.
pub fn validate_work(
    work: &WorkDescriptor,
    properties: Option<&DeviceProperties>,
) -> Result<(), WorkSizeError> {
    validate_extents(work)?;

    match properties {
        Some(properties) => validate_units(work, properties),
        None => Ok(()),
    }
}

/// Validate that both extents are non-zero and that the local extent divides the global one.
pub fn validate_extents(work: &WorkDescriptor) -> Result<(), WorkSizeError> {
    let WorkDescriptor { global, local } = *work;

    if global.num_elems() == 0 || local.num_elems() == 0 {
        return Err(WorkSizeError::Empty { global, local });
    }

    if global.x % local.x != 0 || global.y % local.y != 0 {
        return Err(WorkSizeError::NotDivisible { global, local });
    }

    Ok(())
}

/// Validate the units of a work group fit within the hardware limits.
pub fn validate_units(
    work: &WorkDescriptor,
    properties: &DeviceProperties,
) -> Result<(), WorkSizeError> {
    let requested = work.local.num_elems();
    let max = properties.max_work_group_size;

    if requested > max {
        Err(WorkSizeError::TooManyUnits { requested, max })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::WorkSize;

    fn work(global: (usize, usize), local: (usize, usize)) -> WorkDescriptor {
        WorkDescriptor::new(
            WorkSize::new_2d(global.0, global.1),
            WorkSize::new_2d(local.0, local.1),
        )
    }

    #[test_log::test]
    fn divisible_extents_are_valid() {
        assert_eq!(validate_work(&work((600, 200), (2, 2)), None), Ok(()));
    }

    #[test_log::test]
    fn odd_extent_is_rejected() {
        let work = work((3, 4), (2, 2));

        assert_eq!(
            validate_work(&work, None),
            Err(WorkSizeError::NotDivisible {
                global: work.global,
                local: work.local
            })
        );
    }

    #[test_log::test]
    fn zero_extent_is_rejected() {
        assert!(matches!(
            validate_work(&work((4, 4), (0, 2)), None),
            Err(WorkSizeError::Empty { .. })
        ));
        assert!(matches!(
            validate_work(&work((0, 4), (2, 2)), None),
            Err(WorkSizeError::Empty { .. })
        ));
    }

    #[test_log::test]
    fn work_group_limit_is_enforced() {
        let properties = DeviceProperties {
            max_work_group_size: 8,
            ..Default::default()
        };

        assert_eq!(
            validate_work(&work((16, 16), (4, 4)), Some(&properties)),
            Err(WorkSizeError::TooManyUnits {
                requested: 16,
                max: 8
            })
        );
        assert_eq!(validate_work(&work((16, 16), (2, 2)), Some(&properties)), Ok(()));
    }
}
