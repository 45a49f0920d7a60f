//! End-to-end: pack, export, reload and draw through the headless backend

use glam::{Vec2, Vec3};
use image::{Rgba, RgbaImage};
use jam_kit::camera::create_camera;
use jam_kit::config::parse_config;
use jam_kit::gpu::{HeadlessBackend, TextureFilter};
use jam_kit::instance;
use jam_kit::loaders::{layout_grid, load_sheet, write_manifest, TextMapping};
use jam_kit::renderer::{create_batch_renderer_from_config, render, Geometry};
use jam_kit::sprites::{self, SpriteInstanceList};
use jam_kit::text::TextInstanceList;

fn tile(w: u32, h: u32, shade: u8) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba([shade, shade, shade, 255]))
}

#[test]
fn packed_atlas_round_trips_through_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let mut atlas = sprites::create_packed_sheet(128, 128);
    for (i, (w, h)) in [(32, 32), (16, 48), (64, 8), (100, 20)].iter().enumerate() {
        sprites::pack(&mut atlas, &format!("tile_{}.png", i), &tile(*w, *h, i as u8 * 40)).unwrap();
    }
    sprites::save_debug(&atlas, dir.path().join("atlas.png")).unwrap();
    std::fs::write(
        dir.path().join("atlas.json"),
        write_manifest(&atlas, "atlas.png").unwrap(),
    )
    .unwrap();

    let mut backend = HeadlessBackend::new();
    let sheet = load_sheet(&mut backend, dir.path().join("atlas.json"), TextureFilter::Nearest)
        .unwrap();
    assert_eq!(sheet.count, atlas.sheet.count);
    for (key, packed) in &atlas.sheet.keys {
        let loaded = sprites::sprite(&sheet, key).unwrap();
        assert_eq!(loaded, *packed);
    }
}

#[test]
fn sprites_and_text_render_in_batches() {
    let config = parse_config(
        r#"
        [renderer]
        batch_size = 4

        [text]
        texture_width = 64
        texture_height = 32
        "#,
    )
    .unwrap();
    let mut backend = HeadlessBackend::new();
    let camera = create_camera(Vec3::ZERO, Vec3::new(16.0, 9.0, 2.0), Vec2::new(1600.0, 900.0))
        .unwrap();
    let mut renderer = create_batch_renderer_from_config(&config.renderer).unwrap();

    // Sprites
    let mut atlas = sprites::create_packed_sheet(64, 64);
    sprites::pack(&mut atlas, "player", &tile(16, 16, 200)).unwrap();
    sprites::generate_texture(&mut atlas, &mut backend, config.sprites.filter).unwrap();
    let mut players = SpriteInstanceList::new(config.sprites.pixels_per_unit);
    for i in 0..10 {
        let handle = players.new_instance();
        players.set_frame(&atlas.sheet, handle, "player").unwrap();
        let item = instance::get_mut(&mut players.list, handle).unwrap();
        instance::set_position(item, Vec3::new(i as f32, 0.0, 0.0));
    }
    let mut square = Geometry::square();
    let stats = render(
        &mut renderer,
        &mut backend,
        &camera,
        &mut atlas.sheet,
        &mut square,
        players.list_mut(),
    )
    .unwrap();
    assert_eq!(stats.instances, 10);
    assert_eq!(stats.draw_calls, 3);

    // Text
    let mut text = TextInstanceList::new(config.text);
    let mut rasterizer = |s: &str| tile(4 * s.len() as u32, 8, 255);
    let labels: Vec<_> = (0..5).map(|_| text.new_instance()).collect();
    for (i, handle) in labels.iter().enumerate() {
        text.set_text(&mut backend, *handle, &format!("label {}", i), &mut rasterizer)
            .unwrap();
    }
    let (sheet, list) = text.parts_mut();
    let stats = render(&mut renderer, &mut backend, &camera, sheet, &mut square, list).unwrap();
    assert_eq!(stats.instances, 5);
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(backend.draw_calls().len(), 5);

    text.delete(&mut backend);
    sprites::delete_packed_sheet(&mut atlas, &mut backend);
    square.delete(&mut backend);
    jam_kit::renderer::delete(&mut renderer, &mut backend);
    assert_eq!(backend.live_textures(), 0);
    assert_eq!(backend.live_buffers(), 0);
}

#[test]
fn text_grid_geometry_draws_as_one_instance() {
    let mut backend = HeadlessBackend::new();
    let mut atlas = sprites::create_packed_sheet(32, 32);
    sprites::pack(&mut atlas, "blank", &tile(8, 8, 0)).unwrap();
    sprites::pack(&mut atlas, "wall", &tile(8, 8, 255)).unwrap();
    sprites::generate_texture(&mut atlas, &mut backend, TextureFilter::Nearest).unwrap();

    let mut mapping = TextMapping::new(&atlas.sheet, "blank").unwrap();
    mapping.set(&atlas.sheet, '#', "wall").unwrap();
    let mut level = layout_grid(&mapping, 1.0, "###\n# #\n###").unwrap();

    let mut list = instance::create_instance_list();
    instance::new_instance(&mut list);
    let camera = create_camera(Vec3::ZERO, Vec3::new(8.0, 8.0, 2.0), Vec2::new(256.0, 256.0))
        .unwrap();
    let mut renderer = jam_kit::renderer::create_batch_renderer(100).unwrap();
    render(&mut renderer, &mut backend, &camera, &mut atlas.sheet, &mut level, &mut list).unwrap();

    let call = backend.draw_calls()[0];
    assert_eq!(call.vertex_count, 9 * 6);
    assert_eq!(call.instance_count, 1);
    let texture = atlas.sheet.texture.unwrap();
    assert_eq!(backend.texture(texture.id).unwrap().texture.size, Vec2::new(32.0, 32.0));
}
