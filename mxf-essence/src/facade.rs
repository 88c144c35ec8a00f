//! Enumerates registered sub-parsers, picks a wrapping for a chosen stream,
//! and drives essence production through the selected parser.

use crate::descriptor::EssenceStreamDescriptor;
use crate::error::{EssenceError, Result};
use crate::parser::EssenceParser;
use crate::wrapping::{WrapType, WrappingConfig, WrappingOption};
use mxf_index::EditRate;
use std::io::{Read, Write};

pub struct EssenceFacade {
    parsers: Vec<Box<dyn EssenceParser>>,
    active: Option<(usize, WrappingConfig)>,
}

impl Default for EssenceFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl EssenceFacade {
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
            active: None,
        }
    }

    pub fn register_parser(&mut self, parser: Box<dyn EssenceParser>) {
        self.parsers.push(parser);
    }

    /// Run every registered parser's `identify_essence` over `source` and
    /// collect the streams each one found, tagged with that parser's index.
    pub fn identify(&mut self, source: &mut dyn Read) -> Result<Vec<(usize, EssenceStreamDescriptor)>> {
        let mut found = Vec::new();
        for (index, parser) in self.parsers.iter_mut().enumerate() {
            for descriptor in parser.identify_essence(source)? {
                found.push((index, descriptor));
            }
        }
        if found.is_empty() {
            return Err(EssenceError::UnidentifiedEssence);
        }
        Ok(found)
    }

    /// Select a wrapping for `descriptor` (found by `parser_index`): the
    /// option matching `requested` if given, else the first viable one.
    /// Commits the choice to the parser and records it as the active
    /// wrapping, updating `descriptor.file_descriptor` to match.
    pub fn select(
        &mut self,
        parser_index: usize,
        mut descriptor: EssenceStreamDescriptor,
        requested: Option<WrapType>,
    ) -> Result<EssenceStreamDescriptor> {
        let parser = self
            .parsers
            .get(parser_index)
            .ok_or(EssenceError::NoWrappingOption)?;
        let options = parser.identify_wrapping_options(&descriptor);

        let chosen = match requested {
            Some(wrap_type) => options
                .into_iter()
                .find(|o| o.wrap_type == wrap_type)
                .ok_or(EssenceError::WrappingNotOffered(wrap_type))?,
            None => options.into_iter().next().ok_or(EssenceError::NoWrappingOption)?,
        };

        descriptor.file_descriptor.essence_container = chosen.essence_container;
        let sample_rate = descriptor.file_descriptor.sample_rate;

        let config = WrappingConfig {
            essence_container: chosen.essence_container,
            wrap_type: chosen.wrap_type,
            sample_rate,
            bytes_per_edit_unit: chosen.fixed_ber_size,
        };

        self.parsers
            .get_mut(parser_index)
            .expect("index validated above")
            .use_stream(descriptor.stream_id, chosen)?;

        self.active = Some((parser_index, config));
        Ok(descriptor)
    }

    pub fn set_edit_rate(&mut self, rate: EditRate) -> Result<()> {
        let (index, config) = self.active.as_mut().ok_or(EssenceError::NoStreamSelected)?;
        self.parsers[*index].set_edit_rate(rate)?;
        config.sample_rate = rate;
        Ok(())
    }

    pub fn read(&mut self, count: u64) -> Result<Vec<u8>> {
        let (index, _) = self.active.as_ref().ok_or(EssenceError::NoStreamSelected)?;
        self.parsers[*index].read(count)
    }

    pub fn write(&mut self, out: &mut dyn Write, count: u64) -> Result<u64> {
        let (index, _) = self.active.as_ref().ok_or(EssenceError::NoStreamSelected)?;
        self.parsers[*index].write(out, count)
    }

    pub fn bytes_per_edit_unit(&self) -> Option<u64> {
        self.active.as_ref().and_then(|(_, c)| c.bytes_per_edit_unit)
    }

    pub fn active_wrapping(&self) -> Option<&WrappingConfig> {
        self.active.as_ref().map(|(_, c)| c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FileDescriptor;
    use mxf_core::UL;

    struct StubParser {
        offered: Vec<WrappingOption>,
        selected: Option<WrappingOption>,
        emitted: u64,
    }

    fn rate() -> EditRate {
        EditRate {
            numerator: 25,
            denominator: 1,
        }
    }

    fn stub_option(wrap_type: WrapType) -> WrappingOption {
        WrappingOption {
            essence_container: UL::new([0x01; 16]),
            item_type: 0x01,
            element_type: 0x15,
            wrap_type,
            can_slave: false,
            can_index: true,
            fixed_ber_size: Some(4),
        }
    }

    impl EssenceParser for StubParser {
        fn identify_essence(&mut self, _source: &mut dyn Read) -> Result<Vec<EssenceStreamDescriptor>> {
            Ok(vec![EssenceStreamDescriptor::new(
                1,
                "stub stream",
                FileDescriptor::new(UL::new([0u8; 16]), rate()),
            )])
        }

        fn identify_wrapping_options(&self, _descriptor: &EssenceStreamDescriptor) -> Vec<WrappingOption> {
            self.offered.clone()
        }

        fn use_stream(&mut self, _stream_id: u32, wrapping: WrappingOption) -> Result<()> {
            self.selected = Some(wrapping);
            Ok(())
        }

        fn set_edit_rate(&mut self, _rate: EditRate) -> Result<()> {
            Ok(())
        }

        fn read(&mut self, count: u64) -> Result<Vec<u8>> {
            self.emitted += count;
            Ok(vec![0u8; count as usize * 4])
        }

        fn bytes_per_edit_unit(&self) -> Option<u64> {
            Some(4)
        }

        fn current_position(&self) -> u64 {
            self.emitted
        }
    }

    #[test]
    fn selects_requested_wrap_type() {
        let mut facade = EssenceFacade::new();
        facade.register_parser(Box::new(StubParser {
            offered: vec![stub_option(WrapType::Frame), stub_option(WrapType::Clip)],
            selected: None,
            emitted: 0,
        }));

        let mut empty: &[u8] = &[];
        let found = facade.identify(&mut empty).unwrap();
        assert_eq!(found.len(), 1);
        let (index, descriptor) = found.into_iter().next().unwrap();

        let descriptor = facade.select(index, descriptor, Some(WrapType::Clip)).unwrap();
        assert_eq!(descriptor.file_descriptor.essence_container, UL::new([0x01; 16]));
        assert_eq!(facade.active_wrapping().unwrap().wrap_type, WrapType::Clip);
    }

    #[test]
    fn falls_back_to_first_viable_when_unrequested() {
        let mut facade = EssenceFacade::new();
        facade.register_parser(Box::new(StubParser {
            offered: vec![stub_option(WrapType::Frame)],
            selected: None,
            emitted: 0,
        }));

        let mut empty: &[u8] = &[];
        let (index, descriptor) = facade.identify(&mut empty).unwrap().into_iter().next().unwrap();
        let _descriptor = facade.select(index, descriptor, None).unwrap();
        assert_eq!(facade.bytes_per_edit_unit(), Some(4));
    }

    #[test]
    fn reading_before_selection_is_an_error() {
        let mut facade = EssenceFacade::new();
        assert!(facade.read(1).is_err());
    }

    #[test]
    fn unoffered_wrap_type_is_rejected() {
        let mut facade = EssenceFacade::new();
        facade.register_parser(Box::new(StubParser {
            offered: vec![stub_option(WrapType::Frame)],
            selected: None,
            emitted: 0,
        }));
        let mut empty: &[u8] = &[];
        let (index, descriptor) = facade.identify(&mut empty).unwrap().into_iter().next().unwrap();
        assert!(facade.select(index, descriptor, Some(WrapType::Clip)).is_err());
    }
}
