//! 头像动画上下文
//!
//! 每个加载的头像一个实例，由调用方持有；所有指令入口和每帧 tick 都经过这里。

use std::future::Future;

use crate::alias::{AliasResolver, CanonicalKey};
use crate::blend::BlendController;
use crate::clip::ClipLayerManager;
use crate::config::AnimationConfig;
use crate::emotion::{
    classify_or_guess, EmotionClassifier, EmotionEstimate, EmotionOutcome, EmotionStateMachine,
    EmotionTable,
};
use crate::gesture::{GestureDriver, GestureKind};
use crate::rig::{AssetLoader, LoadedAsset, RigIndex};
use crate::sync::{AnimateCommand, CommandKind};
use crate::viseme::VisemeDriver;
use crate::Result;

/// 眨眼动作名
pub const BLINK_ACTION: &str = "blink";

/// 头像动画上下文
pub struct AvatarAnimationContext {
    config: AnimationConfig,
    rig: RigIndex,
    resolver: AliasResolver,
    blend: BlendController,
    emotions: EmotionStateMachine,
    gestures: GestureDriver,
    visemes: VisemeDriver,
    clips: ClipLayerManager,
    last_tick: Option<f64>,
}

impl AvatarAnimationContext {
    /// 创建上下文（尚未加载模型）
    pub fn new(config: AnimationConfig) -> Self {
        Self {
            rig: RigIndex::empty(),
            resolver: AliasResolver::new(config.alias_table()),
            blend: BlendController::new(config.default_easing),
            emotions: EmotionStateMachine::new(EmotionTable::builtin(), config.reset_duration),
            gestures: GestureDriver::new(&config),
            visemes: VisemeDriver::new(config.viseme_hold, config.viseme_release),
            clips: ClipLayerManager::new(config.clip_layers, config.clip_fade_time),
            last_tick: None,
            config,
        }
    }

    /// 替换情绪定义表
    pub fn with_emotions(mut self, table: EmotionTable) -> Self {
        self.emotions = EmotionStateMachine::new(table, self.config.reset_duration);
        self
    }

    /// 通过外部加载器加载模型
    ///
    /// 加载失败时保留之前的模型与全部状态，并把加载器的错误返回给调用方。
    pub fn load_model<L>(&mut self, loader: &L, url: &str) -> Result<()>
    where
        L: AssetLoader + ?Sized,
    {
        match loader.load(url) {
            Ok(asset) => {
                self.load_asset(asset);
                log::info!("model loaded from {url}");
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load model {url}: {e}");
                Err(e)
            }
        }
    }

    /// 用已解析的资源替换当前模型
    ///
    /// 旧模型的补间、动作和口型状态全部丢弃，之后不会再写入旧的数组。
    pub fn load_asset(&mut self, asset: LoadedAsset) {
        let rig = RigIndex::build(&asset.scene_root);

        self.blend.clear();
        self.gestures.clear();
        self.visemes.reset();
        self.resolver.invalidate();
        self.clips.reset_clips(asset.clips);
        self.rig = rig;

        log::info!(
            "rig ready: {} morph meshes, {} clips",
            self.rig.mesh_count(),
            self.clips.clips().len()
        );
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn rig(&self) -> &RigIndex {
        &self.rig
    }

    pub fn blend(&self) -> &BlendController {
        &self.blend
    }

    pub fn gestures(&self) -> &GestureDriver {
        &self.gestures
    }

    pub fn clips(&self) -> &ClipLayerManager {
        &self.clips
    }

    pub fn visemes_active(&self) -> bool {
        self.visemes.is_active()
    }

    /// 解析规范键
    pub fn resolve(&mut self, key: CanonicalKey) -> Option<String> {
        self.resolver.resolve(&self.rig, key)
    }

    /// 通道当前写入的权重
    pub fn weight(&self, channel: &str) -> f32 {
        self.blend.get_weight(&self.rig, channel)
    }

    // ========== 指令入口 ==========

    pub fn apply_emotion(&mut self, label: &str, intensity: f32, now: f64) -> EmotionOutcome {
        self.apply_emotion_timed(label, intensity, None, now)
    }

    /// `duration` 覆盖各类别的抬起时长
    pub fn apply_emotion_timed(
        &mut self,
        label: &str,
        intensity: f32,
        duration: Option<f32>,
        now: f64,
    ) -> EmotionOutcome {
        self.emotions.apply(
            &self.rig,
            &mut self.resolver,
            &mut self.blend,
            &mut self.gestures,
            label,
            intensity,
            duration,
            now,
        )
    }

    /// 按配置的超时调用外部分类器，失败或超时回退到关键词启发式
    ///
    /// 返回的 future 不借用上下文，等待期间照常 tick；结果交给 [`Self::apply_emotion`]。
    pub fn classify<'a, C>(
        &self,
        classifier: &'a C,
        text: &'a str,
    ) -> impl Future<Output = EmotionEstimate> + 'a
    where
        C: EmotionClassifier + 'a,
    {
        classify_or_guess(classifier, text, self.config.classifier_timeout())
    }

    pub fn play_action(&mut self, name: &str, now: f64) -> bool {
        self.play_action_with(name, now, None, 1.0)
    }

    /// 播放离散动作：眨眼或程序化动作；未知动作返回 `false`
    pub fn play_action_with(
        &mut self,
        name: &str,
        now: f64,
        duration: Option<f32>,
        amplitude_scale: f32,
    ) -> bool {
        if name.trim().eq_ignore_ascii_case(BLINK_ACTION) {
            return self.blink(duration.unwrap_or(self.config.blink_duration), now);
        }
        match name.parse::<GestureKind>() {
            Ok(kind) => self
                .gestures
                .play_with(&self.rig, kind, now, duration, amplitude_scale),
            Err(()) => {
                log::debug!("unknown action {name:?}");
                false
            }
        }
    }

    /// 双眼闭合再睁开；没有左右眼通道时退回单一眨眼通道
    fn blink(&mut self, duration: f32, now: f64) -> bool {
        let mut channels: Vec<String> = [CanonicalKey::EyeBlinkLeft, CanonicalKey::EyeBlinkRight]
            .into_iter()
            .filter_map(|key| self.resolver.resolve(&self.rig, key))
            .collect();
        if channels.is_empty() {
            channels.extend(self.resolver.resolve(&self.rig, CanonicalKey::EyeBlink));
        }
        channels.dedup();

        let mut any = false;
        for channel in &channels {
            any |= self.blend.schedule_pulse(&self.rig, channel, 1.0, duration, now);
        }
        any
    }

    pub fn apply_viseme(&mut self, id: &str, strength: f32, now: f64) {
        self.visemes
            .apply(&self.rig, &mut self.resolver, &mut self.blend, id, strength, now);
    }

    /// 提前结束口型，通道渐变回当前情绪的目标值
    pub fn release_visemes(&mut self, now: f64) {
        self.visemes.release(&self.rig, &mut self.blend, now);
    }

    pub fn play_clip(&mut self, name: &str, fade: Option<f32>) -> bool {
        self.clips.play(name, fade)
    }

    /// 按类型分发动画指令，本地与远端指令走同一条路径
    pub fn apply_command(&mut self, command: &AnimateCommand, now: f64) -> bool {
        log::debug!(
            "apply {:?} {:?} from {:?}",
            command.kind,
            command.name,
            command.origin
        );
        match command.kind {
            CommandKind::Emotion => {
                let intensity = command.value.unwrap_or(1.0);
                self.apply_emotion_timed(&command.name, intensity, command.duration, now);
                true
            }
            CommandKind::Action => {
                let scale = command.value.unwrap_or(1.0);
                self.play_action_with(&command.name, now, command.duration, scale)
            }
            CommandKind::Clip => self.play_clip(&command.name, command.duration),
            CommandKind::Viseme => {
                let strength = command.value.unwrap_or(1.0);
                self.apply_viseme(&command.name, strength, now);
                true
            }
        }
    }

    /// 每帧调用一次
    pub fn tick(&mut self, now: f64) {
        let dt = self.last_tick.map(|t| (now - t).max(0.0) as f32).unwrap_or(0.0);
        self.last_tick = Some(now);

        self.visemes.tick(&self.rig, &mut self.blend, now);
        self.blend.tick(&self.rig, now);
        self.gestures.tick(now);
        self.clips.update(dt);
    }
}

impl Default for AvatarAnimationContext {
    fn default() -> Self {
        Self::new(AnimationConfig::default())
    }
}
