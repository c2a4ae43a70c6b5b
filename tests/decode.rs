mod common;

use std::sync::Arc;
use std::thread;

use common::{argb, Frame, GifBuilder, BLACK, BLUE, GREEN, RED, WHITE};
use gifseq::animation::{frames_by_timestamp, FrameDecoder, Sequence};
use gifseq::render::Pixels;
use gifseq::{
    Allocator, DecodeStatus, DisposalMethod, ErrorKind, FrameSequence, FreeLists, GifError,
    HeapAllocator, LoopCount, PixelFormat,
};

const TRANSPARENT: u32 = 0;

fn render_all(sequence: &FrameSequence, allocator: impl Allocator) -> Vec<Vec<u32>> {
    let mut decoder = sequence.decoder(allocator);
    (0..sequence.frame_count())
        .map(|index| decoder.decode_frame(index).unwrap().to_vec())
        .collect()
}

fn animation() -> Vec<u8> {
    GifBuilder::new(4, 4)
        .palette(&[BLACK, WHITE, RED, GREEN])
        .loop_count(0)
        .frame(Frame::filled(4, 4, 1).delay(20))
        .frame(Frame::filled(2, 2, 2).at(1, 1).delay(20))
        .comment("generated")
        .frame(Frame::new(2, 1, &[3, 0]).at(2, 3).transparent(0).delay(20))
        .frame(Frame::filled(4, 1, 0).without_control())
        .build()
}

#[test]
fn decodes_two_by_two() {
    let gif = GifBuilder::new(2, 2).frame(Frame::new(2, 2, &[0, 1, 1, 0])).build();
    let sequence = FrameSequence::parse(gif).unwrap();

    let mut decoder = sequence.decoder(HeapAllocator);
    let canvas = decoder.decode_frame(0).unwrap();
    assert_eq!(canvas, [argb(BLACK), argb(WHITE), argb(WHITE), argb(BLACK)]);
    assert_eq!(decoder.status(), DecodeStatus::Ok);
}

#[test]
fn parses_frame_metadata() {
    let sequence = FrameSequence::parse(animation()).unwrap();
    assert_eq!((sequence.width(), sequence.height()), (4, 4));
    assert_eq!(sequence.frame_count(), 4);
    assert_eq!(sequence.loop_count(), Some(LoopCount::Infinite));

    let frames = sequence.frames();
    assert_eq!(frames[1].rect(), (1, 1, 2, 2));
    assert_eq!(frames[2].transparent_index(), Some(0));
    assert_eq!(frames[3].delay_centiseconds(), 10);
    assert_eq!(frames[3].disposal_method(), DisposalMethod::DoNotDispose);
    assert_eq!(sequence.duration_ms(), 700);
    for (index, frame) in frames.iter().enumerate() {
        assert_eq!(frame.index(), index);
    }

    // compressed data regions never overlap and move forward
    for pair in frames.windows(2) {
        assert!(pair[0].compressed_data().end <= pair[1].compressed_data().start);
    }
}

#[test]
fn composites_frames_in_order() {
    common::init_logging();
    let sequence = FrameSequence::parse(animation()).unwrap();
    let frames = render_all(&sequence, HeapAllocator);

    let (w, r, g, b) = (argb(WHITE), argb(RED), argb(GREEN), argb(BLACK));
    assert_eq!(frames[0], [w; 16]);
    assert_eq!(frames[1], [
        w, w, w, w,
        w, r, r, w,
        w, r, r, w,
        w, w, w, w,
    ]);
    // index 0 is transparent in frame 2, so the pixel under it keeps white
    assert_eq!(frames[2], [
        w, w, w, w,
        w, r, r, w,
        w, r, r, w,
        w, w, g, w,
    ]);
    // frame 3 reuses the global table without transparency, index 0 is black again
    assert_eq!(frames[3], [
        b, b, b, b,
        w, r, r, w,
        w, r, r, w,
        w, w, g, w,
    ]);
}

#[test]
fn background_disposal_paints_previous_rect() {
    let gif = GifBuilder::new(3, 3)
        .palette(&[BLACK, WHITE, RED, BLUE])
        .background(2)
        .frame(Frame::filled(3, 3, 1).disposal(2))
        .frame(Frame::filled(1, 1, 0).at(1, 1))
        .build();
    let sequence = FrameSequence::parse(gif).unwrap();
    assert_eq!(sequence.background_color(), argb(RED));

    let frames = render_all(&sequence, HeapAllocator);
    let r = argb(RED);
    assert_eq!(frames[1], [r, r, r, r, argb(BLACK), r, r, r, r]);
}

#[test]
fn background_disposal_under_transparent_frame_clears() {
    let gif = GifBuilder::new(2, 1)
        .palette(&[BLACK, WHITE, RED, BLUE])
        .background(2)
        .frame(Frame::filled(2, 1, 1).disposal(2))
        .frame(Frame::new(1, 1, &[3]).transparent(0))
        .build();
    let sequence = FrameSequence::parse(gif).unwrap();

    let frames = render_all(&sequence, HeapAllocator);
    assert_eq!(frames[1], [argb(BLUE), TRANSPARENT]);
}

#[test]
fn restore_to_previous_is_unsupported() {
    let gif = GifBuilder::new(2, 2)
        .frame(Frame::filled(2, 2, 1).disposal(3))
        .frame(Frame::filled(2, 2, 0))
        .build();
    let sequence = FrameSequence::parse(gif).unwrap();
    assert_eq!(sequence.frames()[0].disposal_method(), DisposalMethod::RestoreToPrevious);

    let mut decoder = sequence.decoder(HeapAllocator);
    decoder.decode_frame(0).unwrap();
    let err = decoder.decode_frame(1).unwrap_err();
    assert_eq!(err, GifError::RestoreToPreviousUnsupported { frame: 1 });
    assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
}

#[test]
fn deinterlaces_rows() {
    let palette: Vec<[u8; 3]> = (0..10).map(|row| [row * 20, 0, 0]).collect();
    let indices: Vec<u8> = (0..10).flat_map(|row| [row, row]).collect();
    let gif = GifBuilder::new(2, 10)
        .palette(&palette)
        .frame(Frame::new(2, 10, &indices).interlaced())
        .build();
    let sequence = FrameSequence::parse(gif).unwrap();
    assert!(sequence.frames()[0].interlace());

    let mut decoder = sequence.decoder(HeapAllocator);
    let canvas = decoder.decode_frame(0).unwrap();
    let expected: Vec<u32> = palette.iter().flat_map(|&color| [argb(color); 2]).collect();
    assert_eq!(canvas, expected);
}

#[test]
fn truncated_image_data_is_partial() {
    // clear code then index 0, cut off before the rest
    let gif = GifBuilder::new(2, 2)
        .palette(&[WHITE, BLACK])
        .frame(Frame::filled(2, 2, 1).raw_data(&[1, 0x04, 0]))
        .build();
    let sequence = FrameSequence::parse(gif).unwrap();

    let mut decoder = sequence.decoder(HeapAllocator);
    let canvas = decoder.decode_frame(0).unwrap().to_vec();
    assert_eq!(decoder.status(), DecodeStatus::PartialDecode);
    assert_eq!(canvas, [argb(WHITE), TRANSPARENT, TRANSPARENT, TRANSPARENT]);
}

#[test]
fn undefined_code_after_clear_is_partial() {
    // clear, then code 6 before anything defines it
    let gif = GifBuilder::new(2, 2)
        .frame(Frame::filled(2, 2, 1).raw_data(&[2, 0x34, 0x0c, 0]))
        .build();
    let sequence = FrameSequence::parse(gif).unwrap();

    let mut decoder = sequence.decoder(HeapAllocator);
    let canvas = decoder.decode_frame(0).unwrap().to_vec();
    assert_eq!(decoder.status(), DecodeStatus::PartialDecode);
    assert_eq!(canvas, [TRANSPARENT; 4]);
}

#[test]
fn status_describes_the_requested_frame() {
    let gif = GifBuilder::new(2, 2)
        .frame(Frame::filled(2, 2, 1).raw_data(&[1, 0x04, 0]))
        .frame(Frame::filled(2, 2, 0))
        .build();
    let sequence = FrameSequence::parse(gif).unwrap();

    // frame 0 is replayed on the way to frame 1
    let mut decoder = sequence.decoder(HeapAllocator);
    assert_eq!(decoder.decode_frame(1).unwrap(), [argb(BLACK); 4]);
    assert_eq!(decoder.status(), DecodeStatus::Ok);

    decoder.decode_frame(0).unwrap();
    assert_eq!(decoder.status(), DecodeStatus::PartialDecode);
}

#[test]
fn local_table_sharing_background_index_clears() {
    // background index 0 doubles as the frame's transparent index byte
    let gif = GifBuilder::new(2, 1)
        .frame(Frame::filled(2, 1, 1).disposal(2))
        .frame(Frame::new(1, 1, &[1]).local_palette(&[BLACK, GREEN]))
        .build();
    let sequence = FrameSequence::parse(gif).unwrap();
    assert_eq!(render_all(&sequence, HeapAllocator)[1], [argb(GREEN), TRANSPARENT]);

    // the same frame drawn with the global table gets the background color
    let gif = GifBuilder::new(2, 1)
        .frame(Frame::filled(2, 1, 1).disposal(2))
        .frame(Frame::new(1, 1, &[1]))
        .build();
    let sequence = FrameSequence::parse(gif).unwrap();
    assert_eq!(render_all(&sequence, HeapAllocator)[1], [argb(WHITE), argb(BLACK)]);
}

#[test]
fn missing_chain_terminator_is_a_format_error() {
    let mut gif = GifBuilder::new(2, 2).frame(Frame::new(2, 2, &[0, 1, 1, 0])).build();
    // drop the chain terminator and the trailer
    gif.truncate(gif.len() - 2);
    let err = FrameSequence::parse(gif).unwrap_err();
    assert!(err.is_format_error());
}

#[test]
fn every_truncation_fails_to_parse() {
    let gif = animation();
    for len in 0..gif.len() {
        let err = FrameSequence::parse(gif[..len].to_vec()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format, "truncated to {len}");
    }
}

#[test]
fn rejects_unknown_block() {
    let mut gif = animation();
    let trailer = gif.len() - 1;
    gif[trailer] = 0x42;
    gif.push(0x3b);
    assert_eq!(
        FrameSequence::parse(gif).unwrap_err(),
        GifError::UnexpectedLabel { label: 0x42, offset: trailer }
    );
}

#[test]
fn requires_a_color_table() {
    let gif = GifBuilder::new(1, 1).without_palette().frame(Frame::filled(1, 1, 0)).build();
    assert_eq!(FrameSequence::parse(gif).unwrap_err(), GifError::MissingColorTable { frame: 0 });

    let gif = GifBuilder::new(1, 1)
        .without_palette()
        .frame(Frame::filled(1, 1, 1).local_palette(&[BLACK, GREEN]))
        .build();
    let sequence = FrameSequence::parse(gif).unwrap();
    assert_eq!(render_all(&sequence, HeapAllocator)[0], [argb(GREEN)]);
}

#[test]
fn rejects_frame_larger_than_canvas() {
    let gif = GifBuilder::new(2, 2).frame(Frame::filled(3, 2, 0)).build();
    assert!(matches!(
        FrameSequence::parse(gif).unwrap_err(),
        GifError::FrameTooLarge { frame: 0, width: 3, height: 2, .. }
    ));
}

#[test]
fn clips_frames_to_the_canvas() {
    let gif = GifBuilder::new(2, 2)
        .frame(Frame::filled(2, 2, 0))
        .frame(Frame::filled(2, 1, 1).at(1, 1))
        .build();
    let sequence = FrameSequence::parse(gif).unwrap();
    let frames = render_all(&sequence, HeapAllocator);
    let (b, w) = (argb(BLACK), argb(WHITE));
    assert_eq!(frames[1], [b, b, b, w]);
}

#[test]
fn random_access_replays_from_the_start() {
    let sequence = FrameSequence::parse(animation()).unwrap();
    let in_order = render_all(&sequence, HeapAllocator);

    let mut decoder = sequence.decoder(HeapAllocator);
    for index in [3, 1, 1, 2, 0, 3] {
        assert_eq!(decoder.decode_frame(index).unwrap(), in_order[index].as_slice());
    }
    let err = decoder.decode_frame(4).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn concurrent_decoders_share_a_sequence() {
    common::init_logging();
    let sequence = Arc::new(FrameSequence::parse(animation()).unwrap());
    let expected = render_all(&sequence, HeapAllocator);
    let pool = Arc::new(FreeLists::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let sequence = Arc::clone(&sequence);
            let pool = Arc::clone(&pool);
            thread::spawn(move || render_all(&sequence, pool))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
    // every decoder handed its buffers back
    assert!(pool.pooled() >= 2);
}

#[test]
fn bitmap_format_follows_first_frame_transparency() {
    let opaque = FrameSequence::parse(animation()).unwrap();
    let mut decoder = opaque.decoder(HeapAllocator);
    decoder.set_default_pixel_format(PixelFormat::Rgb565);
    let bitmap = decoder.decode_bitmap(0).unwrap();
    assert_eq!(decoder.first_frame_transparent(), Some(false));
    assert_eq!(bitmap.format(), PixelFormat::Rgb565);
    assert_eq!(bitmap.get(0, 0), argb(WHITE) & 0xfff8_fcf8);

    let gif = GifBuilder::new(2, 1).frame(Frame::new(2, 1, &[0, 1]).transparent(0)).build();
    let transparent = FrameSequence::parse(gif).unwrap();
    let mut decoder = transparent.decoder(HeapAllocator);
    decoder.set_default_pixel_format(PixelFormat::Rgb565);
    let bitmap = FrameDecoder::decode_bitmap(&mut decoder, 0).unwrap();
    assert_eq!(decoder.first_frame_transparent(), Some(true));
    assert_eq!(bitmap.format(), PixelFormat::Argb8888);
    assert_eq!(bitmap.data(), &[0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff]);
}

#[test]
fn assigns_timestamps_from_rendered_pixels() {
    let sequence = FrameSequence::parse(animation()).unwrap();
    let white = argb(WHITE);
    sequence
        .assign_timestamps(HeapAllocator, |pixels: &dyn Pixels| {
            let mut count = 0;
            for y in 0..pixels.height() {
                for x in 0..pixels.width() {
                    count += i64::from(pixels.get(x, y) == white);
                }
            }
            count
        })
        .unwrap();

    let timestamps: Vec<_> = sequence.frames().iter().map(|frame| frame.timestamp()).collect();
    assert_eq!(timestamps, [Some(16), Some(12), Some(11), Some(7)]);
    assert_eq!(frames_by_timestamp(&sequence), [3, 2, 1, 0]);

    // a timestamp is only ever set once
    let mut decoder = sequence.decoder(HeapAllocator);
    assert_eq!(decoder.assign_timestamp(0, |_| 99).unwrap(), 16);
}
