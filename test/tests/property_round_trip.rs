//! Codec properties: anything a host writes, the peer reads back to an
//! identical value, and identical values hash identically.

use proptest::prelude::*;

use statecast_shared::{
    math::Vec2, Button, ButtonSet, ByteReader, ByteWriter, Replicate, Serde, Transform,
    UserCommand,
};
use statecast_test::test_protocol::Health;

fn finite_f32() -> impl Strategy<Value = f32> {
    (-1.0e6f32..1.0e6f32).prop_map(|value| value)
}

fn any_button_set() -> impl Strategy<Value = ButtonSet> {
    proptest::collection::vec(
        prop_oneof![
            Just(Button::Up),
            Just(Button::Down),
            Just(Button::Left),
            Just(Button::Right),
            Just(Button::Primary),
            Just(Button::Secondary),
        ],
        0..4,
    )
    .prop_map(|buttons| {
        let mut set = ButtonSet::EMPTY;
        for button in buttons {
            set.insert(button);
        }
        set
    })
}

proptest! {
    #[test]
    fn transform_survives_the_wire(
        px in finite_f32(),
        py in finite_f32(),
        vx in finite_f32(),
        vy in finite_f32(),
    ) {
        let original = Transform::new(Vec2::new(px, py), Vec2::new(vx, vy));
        let mut writer = ByteWriter::new();
        original.write(&mut writer);
        let bytes = writer.to_bytes();

        let mut decoded = Transform::default();
        let mut reader = ByteReader::new(&bytes);
        decoded.read(&mut reader).unwrap();

        prop_assert_eq!(decoded.position(), original.position());
        prop_assert_eq!(decoded.velocity(), original.velocity());

        let original_dyn: &dyn Replicate = &original;
        let decoded_dyn: &dyn Replicate = &decoded;
        prop_assert_eq!(original_dyn.content_hash(), decoded_dyn.content_hash());
    }

    #[test]
    fn health_survives_the_wire(current in any::<i32>(), maximum in any::<i32>()) {
        let original = Health::new(current, maximum);
        let mut writer = ByteWriter::new();
        original.write(&mut writer);
        let bytes = writer.to_bytes();

        let mut decoded = Health::default();
        let mut reader = ByteReader::new(&bytes);
        decoded.read(&mut reader).unwrap();

        prop_assert_eq!(decoded.current(), current);
        prop_assert_eq!(decoded.maximum(), maximum);
    }

    #[test]
    fn user_command_survives_the_wire(
        sequence in any::<u32>(),
        delta_time in 0.0f32..1.0,
        previous_buttons in any_button_set(),
        buttons in any_button_set(),
        pointed_tile_x in any::<i32>(),
        pointed_tile_y in any::<i32>(),
        last_received_server_tick in any::<u32>(),
    ) {
        let original = UserCommand {
            sequence,
            delta_time,
            previous_buttons,
            buttons,
            pointed_tile_x,
            pointed_tile_y,
            last_received_server_tick,
        };
        let mut writer = ByteWriter::new();
        original.ser(&mut writer);
        let bytes = writer.to_bytes();

        let mut reader = ByteReader::new(&bytes);
        let decoded = UserCommand::de(&mut reader).unwrap();
        prop_assert_eq!(decoded, original);
    }
}
